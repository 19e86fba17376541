pub mod api_key;
pub mod paystack_sig;
