use std::path::{Path, PathBuf};

use crate::api::{Endpoint, Query, Transport};
use crate::error::{PortalError, PortalResult};
use crate::forms::PaymentForm;
use crate::models::{FeeDetails, FeePayment};
use crate::normalize::{self, shapes};
use crate::notify::Notifications;
use crate::view_state::{Blank, Phase, ViewState};

use super::sanitize_file_stem;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeeOverview {
    pub details: FeeDetails,
    pub payments: Vec<FeePayment>,
}

impl Blank for FeeOverview {
    fn is_blank(&self) -> bool {
        self.details == FeeDetails::default() && self.payments.is_empty()
    }
}

#[derive(Default)]
pub struct FeeView {
    pub state: ViewState<FeeOverview>,
    /// Balance carried on the child record, used when the fees route omits it.
    pub(crate) fallback: Option<FeeDetails>,
}

impl FeeView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero until fee details have loaded, which blocks any payment.
    pub fn pending_amount(&self) -> f64 {
        self.state
            .data()
            .map(|fees| fees.details.pending_amount)
            .unwrap_or_default()
    }

    pub async fn load(
        &mut self,
        api: &dyn Transport,
        child_id: &str,
        notices: &mut Notifications,
    ) -> Phase {
        let ticket = self.state.begin(Some(child_id));
        let result = fetch(api, child_id, self.fallback).await;
        self.state.resolve(&ticket, result);
        if self.state.phase() == Phase::Error {
            let err = self.state.error().unwrap_or_default().to_string();
            notices.error("Failed to load fee details:", err);
        }
        self.state.phase()
    }

    /// Checks the amount against the pending balance before anything is sent.
    pub async fn submit_payment(
        &mut self,
        api: &dyn Transport,
        child_id: &str,
        form: &PaymentForm,
        notices: &mut Notifications,
    ) -> PortalResult<()> {
        let amount = match form.validate(self.pending_amount()) {
            Ok(amount) => amount,
            Err(err) => {
                notices.error("Payment not submitted:", &err);
                return Err(err.into());
            }
        };

        let endpoint = Endpoint::SubmitFeePayment(child_id.to_string());
        if let Err(err) = api.post(&endpoint, form.to_body(amount)).await {
            notices.error("Payment failed:", &err);
            return Err(err.into());
        }

        tracing::info!(child_id, amount, mode = form.mode.as_str(), "Fee payment submitted");
        if let Some(fees) = self.state.data_mut() {
            fees.details.paid_amount += amount;
            fees.details.pending_amount = (fees.details.pending_amount - amount).max(0.0);
        }
        notices.success("Payment submitted successfully");
        self.load(api, child_id, notices).await;
        Ok(())
    }

    /// Saves the receipt PDF under `dir` and returns its path.
    pub async fn download_receipt(
        &self,
        api: &dyn Transport,
        payment_id: &str,
        dir: &Path,
        notices: &mut Notifications,
    ) -> PortalResult<PathBuf> {
        let stem = self
            .state
            .data()
            .and_then(|fees| fees.payments.iter().find(|p| p.id == payment_id))
            .map(|p| {
                if p.receipt_number.is_empty() {
                    p.id.clone()
                } else {
                    p.receipt_number.clone()
                }
            })
            .ok_or_else(|| PortalError::not_found("payment", payment_id))?;

        let file_name = format!("receipt-{}.pdf", sanitize_file_stem(&stem));
        let endpoint = Endpoint::DownloadReceipt(payment_id.to_string());
        match save_download(api, &endpoint, dir, &file_name).await {
            Ok(path) => {
                notices.success("Receipt downloaded");
                Ok(path)
            }
            Err(err) => {
                notices.error("Failed to download receipt:", &err);
                Err(err)
            }
        }
    }
}

pub async fn fetch(
    api: &dyn Transport,
    child_id: &str,
    fallback: Option<FeeDetails>,
) -> PortalResult<FeeOverview> {
    let resp = api
        .get(&Endpoint::ChildFees(child_id.to_string()), &Query::new())
        .await?;
    let details = match normalize::extract_entity::<FeeDetails>(&resp, shapes::FEES) {
        Some(details) if !details.is_blank() => details,
        _ => {
            if fallback.is_some() {
                tracing::debug!(child_id, "Fee details missing from response, using child record");
            }
            fallback.unwrap_or_default()
        }
    };
    let mut payments: Vec<FeePayment> = normalize::extract_items(&resp, shapes::PAYMENTS);
    payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
    Ok(FeeOverview { details, payments })
}

/// Fetches a binary payload and writes it to `dir/file_name`.
pub(crate) async fn save_download(
    api: &dyn Transport,
    endpoint: &Endpoint,
    dir: &Path,
    file_name: &str,
) -> PortalResult<PathBuf> {
    let download = api.download(endpoint).await?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, &download.bytes).await?;
    tracing::info!(
        endpoint = endpoint.label(),
        path = %path.display(),
        bytes = download.bytes.len(),
        "Saved download"
    );
    Ok(path)
}
