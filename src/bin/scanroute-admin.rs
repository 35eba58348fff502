use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rand::RngExt;
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use scanroute::config::{Config, DatabaseBackend};
use scanroute::content::{
    encode_event, encode_vcard, social_url, wifi_payload, EventFields, SocialPlatform, VCardFields,
    WifiAuth, WifiFields,
};
use scanroute::models::{GeoData, MultiUrl, QrAction, QrActionKind, QrRecord, QrType};
use scanroute::storage::{PostgresStorage, SqliteStorage, Storage, StorageError};

const ID_ALPHABET: &[u8] = b"abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const ID_LEN: usize = 8;

#[derive(Parser)]
#[command(name = "scanroute-admin")]
#[command(about = "Manage QR records, menu actions and scan logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a static or dynamic link
    AddLink {
        url: String,
        /// Register as a static code (default: dynamic)
        #[arg(long = "static")]
        static_code: bool,
        #[arg(long)]
        id: Option<String>,
    },
    /// Register a social profile link
    AddSocial {
        /// instagram, facebook, twitter, x, linkedin, tiktok, youtube, github, telegram
        platform: String,
        handle: String,
        #[arg(long)]
        id: Option<String>,
    },
    /// Register a weighted multi-url code; entries are `url` or `url=weight`
    AddMulti {
        #[arg(required = true)]
        entries: Vec<String>,
        #[arg(long)]
        id: Option<String>,
    },
    /// Register a location code
    AddGeo {
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lng: Option<f64>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        id: Option<String>,
    },
    /// Register an immediate email / phone / sms action
    AddAction {
        /// email, phone or sms
        action_type: String,
        /// Action payload as a JSON object, e.g. '{"phone":"+15550100"}'
        data: String,
        #[arg(long)]
        id: Option<String>,
    },
    /// Register a contact card
    AddVcard {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        organization: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        id: Option<String>,
    },
    /// Register a calendar event (times in RFC 3339)
    AddEvent {
        title: String,
        #[arg(long, value_parser = parse_time)]
        start: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_time)]
        end: Option<DateTime<Utc>>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        id: Option<String>,
    },
    /// Register a plain text code
    AddText {
        text: String,
        #[arg(long)]
        id: Option<String>,
    },
    /// Register a WiFi join code, shown as text when scanned through the server
    AddWifi {
        ssid: String,
        #[arg(long)]
        password: Option<String>,
        /// WPA, WEP or nopass
        #[arg(long, default_value = "WPA")]
        auth: String,
        #[arg(long)]
        hidden: bool,
        #[arg(long)]
        id: Option<String>,
    },
    /// Register an empty multi-action menu
    AddMenu {
        #[arg(long)]
        id: Option<String>,
    },
    /// Add an entry to a multi-action menu
    AddMenuAction {
        qr_id: String,
        /// call, website, whatsapp, directions or vcard
        action_type: String,
        /// Action payload as a JSON object
        data: String,
        #[arg(long, default_value_t = 0)]
        order: i64,
        #[arg(long)]
        inactive: bool,
        #[arg(long)]
        id: Option<String>,
    },
    /// Reactivate a QR record
    Activate { id: String },
    /// Deactivate a QR record
    Deactivate { id: String },
    /// Print a QR record and its menu
    Show { id: String },
    /// Print the most recent scans of a QR record
    Scans {
        id: String,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let storage: Arc<dyn Storage> = match config.database.backend {
        DatabaseBackend::Sqlite => Arc::new(
            SqliteStorage::new(&config.database.url, config.database.max_connections).await?,
        ),
        DatabaseBackend::Postgres => Arc::new(
            PostgresStorage::new(&config.database.url, config.database.max_connections).await?,
        ),
    };

    // Ensure database is initialized
    storage.init().await?;

    match cli.command {
        Commands::AddLink {
            url,
            static_code,
            id,
        } => {
            let qr_type = if static_code {
                QrType::Static
            } else {
                QrType::Dynamic
            };
            create(&storage, QrRecord::new(id_or_random(id), qr_type).with_destination(url)).await?;
        }
        Commands::AddSocial {
            platform,
            handle,
            id,
        } => {
            let platform = SocialPlatform::parse(&platform)
                .with_context(|| format!("unsupported platform '{platform}'"))?;
            let url = social_url(platform, &handle);
            create(
                &storage,
                QrRecord::new(id_or_random(id), QrType::Dynamic).with_destination(url),
            )
            .await?;
        }
        Commands::AddMulti { entries, id } => {
            let urls = entries
                .iter()
                .map(String::as_str)
                .map(parse_multi_entry)
                .collect::<Result<Vec<_>>>()?;
            create(
                &storage,
                QrRecord::new(id_or_random(id), QrType::MultiUrl).with_multi_urls(urls),
            )
            .await?;
        }
        Commands::AddGeo {
            lat,
            lng,
            address,
            id,
        } => {
            let geo = GeoData {
                latitude: lat,
                longitude: lng,
                address,
            };
            if geo.coordinates().is_none() && geo.address().is_none() {
                bail!("a location needs --lat and --lng, or --address");
            }
            create(&storage, QrRecord::new(id_or_random(id), QrType::Geo).with_geo(geo)).await?;
        }
        Commands::AddAction {
            action_type,
            data,
            id,
        } => {
            let data = parse_json_object(&data)?;
            create(
                &storage,
                QrRecord::new(id_or_random(id), QrType::Action).with_action(action_type, data),
            )
            .await?;
        }
        Commands::AddVcard {
            first_name,
            last_name,
            organization,
            title,
            phone,
            email,
            website,
            address,
            id,
        } => {
            let fields = VCardFields {
                first_name,
                last_name,
                organization,
                title,
                phone,
                email,
                website,
                address,
            };
            let record = QrRecord::new(id_or_random(id), QrType::Vcard)
                .with_destination(encode_vcard(&fields))
                .with_action("vcard", serde_json::to_value(&fields)?);
            create(&storage, record).await?;
        }
        Commands::AddEvent {
            title,
            start,
            end,
            location,
            description,
            id,
        } => {
            let fields = EventFields {
                title: Some(title),
                description,
                location,
                start,
                end,
                uid: None,
            };
            let record = QrRecord::new(id_or_random(id), QrType::Event)
                .with_destination(encode_event(&fields, Utc::now()));
            create(&storage, record).await?;
        }
        Commands::AddText { text, id } => {
            create(&storage, QrRecord::new(id_or_random(id), QrType::Text).with_destination(text))
                .await?;
        }
        Commands::AddWifi {
            ssid,
            password,
            auth,
            hidden,
            id,
        } => {
            let auth =
                WifiAuth::parse(&auth).with_context(|| format!("unsupported WiFi auth '{auth}'"))?;
            let payload = wifi_payload(&WifiFields {
                ssid,
                password,
                auth,
                hidden,
            });
            create(
                &storage,
                QrRecord::new(id_or_random(id), QrType::Text).with_destination(payload),
            )
            .await?;
        }
        Commands::AddMenu { id } => {
            create(&storage, QrRecord::new(id_or_random(id), QrType::MultiAction)).await?;
        }
        Commands::AddMenuAction {
            qr_id,
            action_type,
            data,
            order,
            inactive,
            id,
        } => {
            let action = QrAction {
                id: id_or_random(id),
                qr_code_id: qr_id.clone(),
                action_type: QrActionKind::parse(&action_type),
                action_data: parse_json_object(&data)?,
                display_order: order,
                is_active: !inactive,
            };
            if let QrActionKind::Unknown(kind) = &action.action_type {
                println!("⚠ Action type '{}' is not recognized; taps on it will fail", kind);
            }

            match storage.create_qr_action(&action).await {
                Ok(saved) => println!("✓ Added action '{}' to menu '{}'", saved.id, qr_id),
                Err(StorageError::MissingParent) => bail!("no QR record with id '{qr_id}'"),
                Err(StorageError::Conflict) => bail!("an action with id '{}' already exists", action.id),
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Activate { id } => set_active(&storage, &id, true).await?,
        Commands::Deactivate { id } => set_active(&storage, &id, false).await?,
        Commands::Show { id } => {
            let record = storage
                .get_qr_record(&id)
                .await?
                .with_context(|| format!("no QR record with id '{id}'"))?;
            println!("{}", serde_json::to_string_pretty(&record)?);

            if record.qr_type == QrType::MultiAction {
                let actions = storage.get_qr_actions(&id).await?;
                println!("{}", serde_json::to_string_pretty(&json!({ "actions": actions }))?);
            }
        }
        Commands::Scans { id, limit } => {
            let logs = storage.list_scan_logs(&id, limit).await?;
            if logs.is_empty() {
                println!("No scans recorded for '{}'.", id);
            } else {
                println!(
                    "{:<12} {:<8} {:<20} {:<20} {}",
                    "Scanned at", "Device", "Country", "City", "Referrer"
                );
                println!("{}", "-".repeat(80));
                for log in logs {
                    println!(
                        "{:<12} {:<8} {:<20} {:<20} {}",
                        log.scanned_at,
                        log.device_type,
                        log.country.as_deref().unwrap_or("-"),
                        log.city.as_deref().unwrap_or("-"),
                        log.referrer.as_deref().unwrap_or("-"),
                    );
                }
            }
        }
    }

    Ok(())
}

async fn create(storage: &Arc<dyn Storage>, record: QrRecord) -> Result<()> {
    match storage.create_qr_record(&record).await {
        Ok(saved) => {
            println!("✓ Created {} QR record '{}'", saved.qr_type, saved.id);
            Ok(())
        }
        Err(StorageError::Conflict) => bail!("a QR record with id '{}' already exists", record.id),
        Err(e) => Err(e.into()),
    }
}

async fn set_active(storage: &Arc<dyn Storage>, id: &str, active: bool) -> Result<()> {
    let verb = if active { "Activated" } else { "Deactivated" };
    if storage.set_active(id, active).await? {
        println!("✓ {} QR record '{}'", verb, id);
    } else {
        println!("⚠ No QR record with id '{}'", id);
    }
    Ok(())
}

fn id_or_random(id: Option<String>) -> String {
    id.unwrap_or_else(|| {
        let mut rng = rand::rng();
        (0..ID_LEN)
            .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
            .collect()
    })
}

fn parse_multi_entry(entry: &str) -> Result<MultiUrl> {
    match entry.rsplit_once('=') {
        Some((url, weight)) if weight.parse::<f64>().is_ok() => {
            let weight = weight.parse::<f64>()?;
            Ok(MultiUrl::new(url, Some(weight)))
        }
        _ => Ok(MultiUrl::new(entry, None)),
    }
}

fn parse_json_object(raw: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value =
        serde_json::from_str(raw).with_context(|| format!("invalid JSON payload: {raw}"))?;
    if !value.is_object() {
        bail!("action payload must be a JSON object");
    }
    Ok(value)
}

fn parse_time(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}
