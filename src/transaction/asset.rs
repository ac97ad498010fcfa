//! ONT and ONG native token calls.

use std::fmt;
use std::str::FromStr;

use crate::codec::CodecError;
use crate::crypto::Address;
use crate::error::Result;
use crate::script::NativeParam;
use crate::transaction::builder::make_native_invoke;
use crate::transaction::tx::UnsignedTransaction;

pub const ONT_CONTRACT: Address = Address::native(1);
pub const ONG_CONTRACT: Address = Address::native(2);

/// A native token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Asset {
    Ont,
    Ong,
}

impl Asset {
    pub fn contract(&self) -> Address {
        match self {
            Asset::Ont => ONT_CONTRACT,
            Asset::Ong => ONG_CONTRACT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Asset::Ont => "ont",
            Asset::Ong => "ong",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Asset {
    type Err = CodecError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ont" => Ok(Asset::Ont),
            "ong" => Ok(Asset::Ong),
            other => Err(CodecError::InvalidValue {
                field: "asset",
                reason: format!("unknown asset '{}'", other),
            }),
        }
    }
}

/// Move `amount` of `asset` from `from` to `to`.
///
/// `from` must sign. The payer (who pays gas) signs too when it differs.
pub fn transfer(
    asset: Asset,
    from: &Address,
    to: &Address,
    amount: u64,
    gas_price: u64,
    gas_limit: u64,
    payer: &Address,
) -> Result<UnsignedTransaction> {
    let state = NativeParam::Struct(vec![from.into(), to.into(), amount.into()]);
    make_native_invoke(
        "transfer",
        &[NativeParam::Array(vec![state])],
        &asset.contract(),
        gas_price,
        gas_limit,
        Some(*payer),
    )
}

/// Balance of `address`. Pre-execute this.
pub fn balance_of(asset: Asset, address: &Address) -> Result<UnsignedTransaction> {
    make_native_invoke("balanceOf", &[NativeParam::from(address)], &asset.contract(), 0, 0, None)
}

/// Withdraw `amount` of ONG unbound to `claimer` by holding ONT.
pub fn claim_ong(
    claimer: &Address,
    to: &Address,
    amount: u64,
    gas_price: u64,
    gas_limit: u64,
    payer: &Address,
) -> Result<UnsignedTransaction> {
    let state = NativeParam::Struct(vec![
        claimer.into(),
        (&ONT_CONTRACT).into(),
        to.into(),
        amount.into(),
    ]);
    make_native_invoke(
        "transferFrom",
        &[state],
        &ONG_CONTRACT,
        gas_price,
        gas_limit,
        Some(*payer),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::OpCode;
    use crate::transaction::payload::Payload;

    fn code(tx: &UnsignedTransaction) -> Vec<u8> {
        match tx.payload() {
            Payload::Invoke { code } => code.clone(),
            Payload::Deploy(_) => panic!("expected an invoke payload"),
        }
    }

    #[test]
    fn test_transfer_shape() {
        let from = Address::native(10);
        let to = Address::native(11);
        let tx = transfer(Asset::Ont, &from, &to, 100, 500, 20_000, &from).unwrap();
        let code = code(&tx);

        assert_eq!(tx.payer(), &from);
        // PUSH0 NEWSTRUCT TOALTSTACK PUSH20(from)
        assert_eq!(&code[..4], &[0x00, 0xc6, 0x6b, 0x14]);
        assert_eq!(&code[4..24], from.as_bytes());
        // 100 is not a small int: PUSHBYTES1 0x64
        let amount_at = code.windows(2).position(|w| w == [0x01, 0x64]).unwrap();
        assert!(amount_at > 24);
        // the one-element array: FROMALTSTACK PUSH1 PACK
        assert!(code
            .windows(3)
            .any(|w| w == [OpCode::FromAltStack as u8, 0x51, OpCode::Pack as u8]));
    }

    #[test]
    fn test_balance_of_targets_asset_contract() {
        let address = Address::native(10);
        let code = code(&balance_of(Asset::Ong, &address).unwrap());
        assert!(code.windows(20).any(|w| w == ONG_CONTRACT.as_bytes()));
        assert!(code.windows(9).any(|w| w == b"balanceOf"));
    }

    #[test]
    fn test_asset_parse() {
        assert_eq!("ONT".parse::<Asset>().unwrap(), Asset::Ont);
        assert_eq!("ong".parse::<Asset>().unwrap(), Asset::Ong);
        assert!("eth".parse::<Asset>().is_err());
    }

    #[test]
    fn test_claim_ong_references_ont_contract() {
        let me = Address::native(10);
        let code = code(&claim_ong(&me, &me, 5, 500, 20_000, &me).unwrap());
        assert!(code.windows(20).any(|w| w == ONT_CONTRACT.as_bytes()));
        assert!(code.windows(12).any(|w| w == b"transferFrom"));
    }
}
