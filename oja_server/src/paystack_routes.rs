//----------------------------------------------   Webhooks  ----------------------------------------------------

use actix_web::{web, HttpRequest, HttpResponse};
use log::*;
use oja_engine::{
    traits::{MarketplaceDatabase, PaymentOutcome},
    OrderFlowApi,
};
use paystack_tools::WebhookEvent;

use crate::{data_objects::JsonResponse, helpers::get_remote_ip, route};

route!(paystack_webhook => Post "/webhook" impl MarketplaceDatabase);
/// Route handler for Paystack charge webhooks.
///
/// The signature middleware has already verified the `x-paystack-signature` header against the
/// raw body, so everything that reaches this handler is authentic. From here the response must
/// always be a 200, whatever happens to the charge itself; a non-2xx response makes Paystack
/// retry the delivery, and replays are already harmless on our side.
pub async fn paystack_webhook<B: MarketplaceDatabase>(
    req: HttpRequest,
    body: web::Json<WebhookEvent>,
    api: web::Data<OrderFlowApi<B>>,
) -> HttpResponse {
    trace!("💰️ Received webhook request from {}: {}", get_remote_ip(&req), req.uri());
    let event = body.into_inner();
    let result = if event.is_charge_success() {
        match api.confirm_payment(&event.data.reference, event.data.amount).await {
            Ok(outcome) => charge_ack(outcome),
            Err(e) => {
                warn!("💰️ Could not apply charge.success for {}. {e}", event.data.reference);
                JsonResponse::failure("Could not apply charge.")
            },
        }
    } else if event.is_charge_failure() {
        match api.fail_payment(&event.data.reference).await {
            Ok(outcome) => charge_ack(outcome),
            Err(e) => {
                warn!("💰️ Could not apply charge.failed for {}. {e}", event.data.reference);
                JsonResponse::failure("Could not apply charge.")
            },
        }
    } else {
        debug!("💰️ Ignoring webhook event {}", event.event);
        JsonResponse::success(format!("Event {} ignored.", event.event))
    };
    HttpResponse::Ok().json(result)
}

fn charge_ack(outcome: PaymentOutcome) -> JsonResponse {
    match outcome {
        PaymentOutcome::Confirmed(order) => JsonResponse::success(format!("Payment for {} confirmed.", order.order_no)),
        PaymentOutcome::Failed(order) => JsonResponse::success(format!("Order {} marked as failed.", order.order_no)),
        PaymentOutcome::AlreadyProcessed(order) => {
            JsonResponse::success(format!("Order {} already processed.", order.order_no))
        },
        PaymentOutcome::Underpaid { order, paid } => {
            JsonResponse::failure(format!("Underpayment of {paid} against {} for {}.", order.total_amount, order.order_no))
        },
        PaymentOutcome::UnmatchedReference(r) => JsonResponse::success(format!("Unknown reference {r} acknowledged.")),
    }
}
