use serde::Serialize;

#[derive(Serialize)]
pub struct TenantRegisteredResponse {
    pub tenant_id: String,
    pub subdomain: String,
}

#[derive(Serialize)]
pub struct PaymentConfirmationResponse {
    pub recorded: bool,
    pub transaction_id: Option<String>,
}
