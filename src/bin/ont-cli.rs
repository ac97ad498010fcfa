use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

use ontology_client::config::{load_config, ClientConfig};
use ontology_client::response::describe_error_code;
use ontology_client::observability::logging;
use ontology_client::transaction::asset::{self, Asset};
use ontology_client::transaction::identity::{self, OntId};
use ontology_client::transport::BlockRef;
use ontology_client::{
    Address, Envelope, Method, NodeError, PrivateKey, RestTransport, RpcClient, Transport, TxHash,
    WebSocketTransport,
};

#[derive(Clone, Copy, ValueEnum)]
enum TransportArg {
    Rest,
    Ws,
}

#[derive(Parser)]
#[command(name = "ont-cli")]
#[command(about = "Query and submit transactions to an Ontology node", long_about = None)]
struct Cli {
    /// TOML client configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the node URL for the chosen transport.
    #[arg(short, long)]
    url: Option<String>,

    #[arg(short, long, value_enum, default_value = "rest")]
    transport: TransportArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Current block height
    Height,
    /// Block by height or hash
    Block { id: String },
    /// Transaction by hash
    Tx { hash: String },
    /// ONT and ONG balance
    Balance { address: String },
    /// Execution event of a transaction
    Event { hash: String },
    /// Merkle proof of a transaction
    Proof { hash: String },
    /// Address and ONT ID of the key in an environment variable
    Whoami {
        #[arg(long, default_value = "ONT_PRIVATE_KEY")]
        key_env: String,
    },
    /// Register the ONT ID of the key in an environment variable
    Register {
        #[arg(long, default_value = "ONT_PRIVATE_KEY")]
        key_env: String,
    },
    /// Look up an ONT ID's description object
    Ddo { ont_id: String },
    /// Transfer ONT or ONG
    Transfer {
        #[arg(long, default_value = "ONT_PRIVATE_KEY")]
        key_env: String,
        #[arg(long, default_value = "ont")]
        asset: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    logging::init(&config.observability);

    let transport: Arc<dyn Transport> = match cli.transport {
        TransportArg::Rest => {
            if let Some(url) = &cli.url {
                config.rest.url = url.clone();
            }
            Arc::new(RestTransport::new(config.rest.clone())?)
        }
        TransportArg::Ws => {
            if let Some(url) = &cli.url {
                config.websocket.url = url.clone();
            }
            Arc::new(WebSocketTransport::connect(config.websocket.clone()).await?)
        }
    };
    let client = RpcClient::new(transport);
    let gas = &config.transaction;

    let envelope = match cli.command {
        Commands::Height => client.transport().query(&Method::BlockHeight).await?,
        Commands::Block { id } => {
            let by = match id.parse::<u32>() {
                Ok(height) => BlockRef::Height(height),
                Err(_) => BlockRef::Hash(id),
            };
            client.transport().query(&Method::Block { by, raw: false }).await?
        }
        Commands::Tx { hash } => {
            let hash = TxHash::from_hex(&hash)?;
            client.transport().query(&Method::RawTransaction { hash, raw: false }).await?
        }
        Commands::Balance { address } => {
            let address: Address = address.parse()?;
            client.transport().query(&Method::Balance { address }).await?
        }
        Commands::Event { hash } => {
            let hash = TxHash::from_hex(&hash)?;
            client.transport().query(&Method::SmartCodeEventByHash { hash }).await?
        }
        Commands::Proof { hash } => {
            let hash = TxHash::from_hex(&hash)?;
            client.transport().query(&Method::MerkleProof { hash }).await?
        }
        Commands::Whoami { key_env } => {
            let key = PrivateKey::from_env(&key_env)?;
            let public_key = key.public_key();
            Envelope::Found(serde_json::json!({
                "address": public_key.address().to_base58(),
                "ont_id": OntId::from_public_key(&public_key).to_string(),
                "public_key": public_key.to_hex(),
            }))
        }
        Commands::Register { key_env } => {
            let key = PrivateKey::from_env(&key_env)?;
            let public_key = key.public_key();
            let ont_id = OntId::from_public_key(&public_key);
            let tx = identity::register_identity(
                &ont_id,
                &public_key,
                gas.gas_price,
                gas.gas_limit,
                Some(public_key.address()),
            )?
            .sign(&key)?;
            client.send_transaction(&tx, true).await?
        }
        Commands::Ddo { ont_id } => {
            let ont_id: OntId = ont_id.parse()?;
            let tx = identity::get_ddo(&ont_id)?;
            client.send_raw_transaction(&tx.serialize()?, true, false).await?
        }
        Commands::Transfer {
            key_env,
            asset,
            to,
            amount,
        } => {
            let key = PrivateKey::from_env(&key_env)?;
            let from = key.public_key().address();
            let asset: Asset = asset.parse()?;
            let to: Address = to.parse()?;
            let tx = asset::transfer(asset, &from, &to, amount, gas.gas_price, gas.gas_limit, &from)?
                .sign(&key)?;
            client.send_transaction(&tx, false).await?
        }
    };

    print_envelope(envelope)
}

fn print_envelope(envelope: Envelope<Value>) -> Result<(), Box<dyn std::error::Error>> {
    match envelope {
        Envelope::Found(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Envelope::NotFound => println!("not found"),
        Envelope::Failed(e) => {
            eprintln!("Error: {}", describe_failure(&e));
            if !e.result.is_null() {
                eprintln!("Response: {}", e.result);
            }
        }
    }
    Ok(())
}

/// Node error line, naming the code when the node sent no description.
fn describe_failure(error: &NodeError) -> String {
    let desc = if error.desc.is_empty() {
        describe_error_code(error.code)
    } else {
        error.desc.as_str()
    };
    format!("node returned code {} ({})", error.code, desc)
}
