//! Decides whether a message came from a bank.

/// Whether `sender_id` contains one of the `bank_senders` codes, ignoring case.
///
/// Gateways prefix codes with a route, e.g. "VM-HDFCBK" or "AD-ICICIBK", so
/// this is a containment test rather than an exact match. An empty sender is
/// never a bank.
pub fn is_bank_sender(sender_id: &str, bank_senders: &[String]) -> bool {
    let sender_id = sender_id.trim().to_uppercase();

    if sender_id.is_empty() {
        return false;
    }

    bank_senders
        .iter()
        .any(|code| sender_id.contains(&code.to_uppercase()))
}
