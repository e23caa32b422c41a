use base64::Engine as _;
use rand::RngCore;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerCfg {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Base64-encoded 32- or 64-byte key used to encrypt the short-lived
    /// OAuth cookies
    #[serde(default)]
    pub cookie_key_base64: String,
    /// Mark cookies Secure; leave off for local development over http
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbCfg {
    /// e.g. phrasebook.sqlite or a full sqlite path
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleCfg {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslateCfg {
    pub deepseek_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerCfg,
    pub db: DbCfg,
    pub google: Option<GoogleCfg>,
    pub translate: TranslateCfg,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_public_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

impl AppConfig {
    /// Reads the whole configuration once at startup. Request paths never
    /// touch the process environment.
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let settings = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        // Map flat env names to the nested structure for convenience:
        // APP_BIND_ADDR, APP_PUBLIC_URL, COOKIE_KEY_BASE64, APP_SECURE_COOKIES,
        // DATABASE_URL, GOOGLE_CLIENT_ID/SECRET/REDIRECT_URI,
        // DEEPSEEK_API_KEY, GEMINI_API_KEY
        let mut server = settings.get::<ServerCfg>("server").unwrap_or_else(|_| ServerCfg {
            bind_addr: std::env::var("APP_BIND_ADDR").unwrap_or_else(|_| default_bind_addr()),
            public_url: std::env::var("APP_PUBLIC_URL").unwrap_or_else(|_| default_public_url()),
            cookie_key_base64: std::env::var("COOKIE_KEY_BASE64").unwrap_or_default(),
            secure_cookies: matches!(
                std::env::var("APP_SECURE_COOKIES").as_deref(),
                Ok("1") | Ok("true") | Ok("yes")
            ),
        });
        if server.cookie_key_base64.is_empty() {
            // Generate a dev key (64 bytes) and keep it in-memory only
            let mut key = [0u8; 64];
            rand::rngs::OsRng.fill_bytes(&mut key);
            server.cookie_key_base64 = base64::engine::general_purpose::STANDARD.encode(key);
            tracing::warn!(
                "COOKIE_KEY_BASE64 not provided; generated a temporary dev key. Pending OAuth flows will not survive a restart."
            );
        }

        let db = match settings.get::<DbCfg>("db") {
            Ok(db) => db,
            Err(_) => DbCfg {
                url: std::env::var("DATABASE_URL")
                    .map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?,
            },
        };

        let google = load_google()?;

        let translate = TranslateCfg {
            deepseek_api_key: std::env::var("DEEPSEEK_API_KEY").ok(),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
        };

        Ok(AppConfig { server, db, google, translate })
    }
}

/// Google sign-in is optional, but a half-configured client is a deployment
/// mistake worth failing on at startup.
fn load_google() -> anyhow::Result<Option<GoogleCfg>> {
    let client_id = std::env::var("GOOGLE_CLIENT_ID").ok();
    let client_secret = std::env::var("GOOGLE_CLIENT_SECRET").ok();
    let redirect_uri = std::env::var("GOOGLE_REDIRECT_URI").ok();
    match (client_id, client_secret, redirect_uri) {
        (Some(client_id), Some(client_secret), Some(redirect_uri)) => {
            Ok(Some(GoogleCfg { client_id, client_secret, redirect_uri }))
        }
        (None, None, None) => Ok(None),
        _ => Err(anyhow::anyhow!(
            "incomplete Google OAuth config: set all of GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET, GOOGLE_REDIRECT_URI or none"
        )),
    }
}

pub fn decode_cookie_key(b64: &str) -> anyhow::Result<[u8; 64]> {
    // tower-cookies expects a 64-byte key (32 for signing + 32 for encryption)
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.as_bytes())
        .map_err(|e| anyhow::anyhow!("invalid COOKIE_KEY_BASE64: {}", e))?;
    if bytes.len() == 32 {
        // A 32-byte key is duplicated to cover both halves
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&bytes);
        out[32..].copy_from_slice(&bytes);
        return Ok(out);
    }
    if bytes.len() != 64 {
        return Err(anyhow::anyhow!(
            "COOKIE_KEY_BASE64 must decode to 32 or 64 bytes, got {}",
            bytes.len()
        ));
    }
    let mut out = [0u8; 64];
    out.copy_from_slice(&bytes);
    Ok(out)
}
