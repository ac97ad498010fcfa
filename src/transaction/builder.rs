//! Generic invoke builders the typed builders are written on.

use crate::crypto::Address;
use crate::error::Result;
use crate::script::{native_invoke_script, NativeParam};
use crate::transaction::payload::Payload;
use crate::transaction::tx::UnsignedTransaction;

/// Wrap arbitrary VM code in an invoke transaction.
pub fn make_invoke(code: Vec<u8>, gas_price: u64, gas_limit: u64, payer: Option<Address>) -> UnsignedTransaction {
    let tx = UnsignedTransaction::new(Payload::Invoke { code }, gas_price, gas_limit);
    match payer {
        Some(payer) => tx.with_payer(payer),
        None => tx,
    }
}

/// Call `method` on the native contract at `contract`.
///
/// The payer defaults to the zero address, which is what pre-executed
/// queries use; set one before signing a transaction meant for the ledger.
pub fn make_native_invoke(
    method: &str,
    params: &[NativeParam],
    contract: &Address,
    gas_price: u64,
    gas_limit: u64,
    payer: Option<Address>,
) -> Result<UnsignedTransaction> {
    let code = native_invoke_script(method, params, contract)?;
    Ok(make_invoke(code, gas_price, gas_limit, payer))
}
