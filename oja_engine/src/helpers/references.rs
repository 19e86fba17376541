use chrono::Utc;
use rand::Rng;

use crate::db_types::OrderNo;

// 0/O and 1/I are left out so order numbers survive being read out loud over the phone.
const ORDER_NO_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
const ORDER_NO_SUFFIX_LEN: usize = 6;

/// Generates a fresh order number, e.g. `OJA-20240614-7G2K4A`.
///
/// Uniqueness is ultimately enforced by the database constraint; the 32^6 suffix space just makes
/// collisions on the same day vanishingly unlikely.
pub fn new_order_number() -> OrderNo {
    let mut rng = rand::thread_rng();
    let suffix: String =
        (0..ORDER_NO_SUFFIX_LEN).map(|_| ORDER_NO_ALPHABET[rng.gen_range(0..ORDER_NO_ALPHABET.len())] as char).collect();
    let date = Utc::now().format("%Y%m%d");
    OrderNo(format!("OJA-{date}-{suffix}"))
}

/// Generates the reference sent to Paystack at payment initialization: the order number plus an
/// 8-hex-char nonce, so a re-initialized payment gets a distinct reference for the same order.
pub fn new_payment_reference(order_no: &OrderNo) -> String {
    let nonce: u32 = rand::thread_rng().gen();
    format!("{}-{nonce:08x}", order_no.as_str())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_numbers_have_the_expected_shape() {
        let order_no = new_order_number();
        let parts: Vec<&str> = order_no.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "OJA");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), ORDER_NO_SUFFIX_LEN);
        assert!(!parts[2].contains('0') && !parts[2].contains('O'));
    }

    #[test]
    fn payment_references_embed_the_order_number() {
        let order_no = OrderNo::from("OJA-20240614-7G2K4A");
        let reference = new_payment_reference(&order_no);
        assert!(reference.starts_with("OJA-20240614-7G2K4A-"));
        assert_eq!(reference.len(), "OJA-20240614-7G2K4A-".len() + 8);
        // A second initialization must not reuse the first reference.
        assert_ne!(reference, new_payment_reference(&order_no));
    }
}
