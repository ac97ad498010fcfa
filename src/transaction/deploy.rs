//! Contract deployment.

use crate::crypto::Address;
use crate::transaction::payload::{DeployCode, Payload};
use crate::transaction::tx::UnsignedTransaction;

/// Descriptive metadata stored alongside deployed code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractMeta {
    pub name: String,
    pub version: String,
    pub author: String,
    pub email: String,
    pub description: String,
    pub need_storage: bool,
}

/// Deploy `code`. The contract's address is the hash of the code.
pub fn deploy_contract(
    code: Vec<u8>,
    meta: ContractMeta,
    gas_price: u64,
    gas_limit: u64,
    payer: &Address,
) -> UnsignedTransaction {
    let payload = Payload::Deploy(DeployCode {
        code,
        need_storage: meta.need_storage,
        name: meta.name,
        version: meta.version,
        author: meta.author,
        email: meta.email,
        description: meta.description,
    });
    UnsignedTransaction::new(payload, gas_price, gas_limit).with_payer(*payer)
}

/// Address a deployment of `code` will live at.
pub fn contract_address(code: &[u8]) -> Address {
    Address::from_program(code)
}
