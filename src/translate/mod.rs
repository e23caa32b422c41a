pub mod lang;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::TranslateCfg;
use crate::error::Error;

/// The five interchangeable backends, selected per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    MyMemory,
    Lingva,
    GoogleTranslate,
    DeepSeek,
    Gemini,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::MyMemory => "mymemory",
            Provider::Lingva => "lingva",
            Provider::GoogleTranslate => "googletranslate",
            Provider::DeepSeek => "deepseek",
            Provider::Gemini => "gemini",
        }
    }
}

impl Default for Provider {
    fn default() -> Self {
        Provider::GoogleTranslate
    }
}

/// Provider catalog surfaced to the UI: (id, display name, pricing note).
pub const TRANSLATION_PROVIDERS: [(&str, &str, &str); 5] = [
    ("googletranslate", "Google Translate", "Free"),
    ("deepseek", "DeepSeek (LLM)", "API Key"),
    ("gemini", "Gemini (LLM)", "API Key"),
    ("mymemory", "MyMemory", "Free 500/day"),
    ("lingva", "Lingva Translate", "Free"),
];

#[derive(Debug, Clone, Serialize)]
pub struct Translation {
    pub translated_text: String,
    pub provider: &'static str,
}

const MYMEMORY_ENDPOINT: &str = "https://api.mymemory.translated.net/get";
const LINGVA_ENDPOINT: &str = "https://lingva.ml/api/v1";
const GOOGLE_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";
const DEEPSEEK_ENDPOINT: &str = "https://api.deepseek.com/v1/chat/completions";
const GEMINI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1/models/gemini-2.0-flash-lite:generateContent";

const DEEPSEEK_MODEL: &str = "deepseek-chat";
const LLM_TEMPERATURE: f64 = 0.3;
const TRANSLATE_INSTRUCTION: &str = "You are a professional translator. Translate the given text accurately and naturally. Only return the translation, no explanations.";

#[derive(Clone)]
pub struct Translator {
    http: reqwest::Client,
    cfg: TranslateCfg,
}

impl Translator {
    pub fn new(cfg: TranslateCfg) -> Self {
        Self { http: reqwest::Client::new(), cfg }
    }

    /// Fan-out over the five stateless adapters. No fallback between
    /// providers and no retries; the first failure is the result.
    pub async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        provider: Provider,
    ) -> Result<Translation, Error> {
        let translated_text = match provider {
            Provider::MyMemory => self.my_memory(text, source_lang, target_lang).await?,
            Provider::Lingva => self.lingva(text, source_lang, target_lang).await?,
            Provider::GoogleTranslate => {
                self.google_translate(text, source_lang, target_lang).await?
            }
            Provider::DeepSeek => self.deepseek(text, source_lang, target_lang).await?,
            Provider::Gemini => self.gemini(text, source_lang, target_lang).await?,
        };
        Ok(Translation { translated_text, provider: provider.as_str() })
    }

    async fn my_memory(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, Error> {
        let langpair = format!("{source_lang}|{target_lang}");
        let response = self
            .http
            .get(MYMEMORY_ENDPOINT)
            .query(&[("q", text), ("langpair", langpair.as_str())])
            .send()
            .await
            .map_err(upstream)?;
        if !response.status().is_success() {
            return Err(Error::Upstream(format!("MyMemory API error: {}", response.status())));
        }
        let body: Value = response.json().await.map_err(upstream)?;
        parse_my_memory(&body)
    }

    async fn lingva(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, Error> {
        // Text rides in the path, so it must be percent-encoded.
        let mut endpoint = url::Url::parse(LINGVA_ENDPOINT)
            .map_err(|e| Error::Internal(anyhow::anyhow!("lingva endpoint: {e}")))?;
        endpoint
            .path_segments_mut()
            .map_err(|_| Error::Internal(anyhow::anyhow!("lingva endpoint cannot be a base")))?
            .push(source_lang)
            .push(target_lang)
            .push(text);
        let response = self.http.get(endpoint).send().await.map_err(upstream)?;
        if !response.status().is_success() {
            return Err(Error::Upstream(format!("Lingva API error: {}", response.status())));
        }
        let body: Value = response.json().await.map_err(upstream)?;
        parse_lingva(&body)
    }

    async fn google_translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, Error> {
        let response = self
            .http
            .get(GOOGLE_TRANSLATE_ENDPOINT)
            .query(&[
                ("client", "gtx"),
                ("sl", source_lang),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(upstream)?;
        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "Google Translate API error: {}",
                response.status()
            )));
        }
        let body: Value = response.json().await.map_err(upstream)?;
        parse_google_segments(&body)
    }

    async fn deepseek(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, Error> {
        let Some(api_key) = self.cfg.deepseek_api_key.as_deref() else {
            return Err(Error::Config("DeepSeek API key not configured".into()));
        };
        let prompt = format!(
            "Translate from {} to {}: {}",
            lang::language_name(source_lang),
            lang::language_name(target_lang),
            text
        );
        let payload = serde_json::json!({
            "model": DEEPSEEK_MODEL,
            "messages": [
                { "role": "system", "content": TRANSLATE_INSTRUCTION },
                { "role": "user", "content": prompt },
            ],
            "temperature": LLM_TEMPERATURE,
        });
        let response = self
            .http
            .post(DEEPSEEK_ENDPOINT)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(upstream)?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!("DeepSeek API error: {status} - {detail}")));
        }
        let body: Value = response.json().await.map_err(upstream)?;
        parse_chat_completion(&body)
    }

    async fn gemini(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, Error> {
        let Some(api_key) = self.cfg.gemini_api_key.as_deref() else {
            return Err(Error::Config("Gemini API key not configured".into()));
        };
        let prompt = format!(
            "Translate from {} to {}. Only return the translation, no explanations:\n\n{}",
            lang::language_name(source_lang),
            lang::language_name(target_lang),
            text
        );
        let payload = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": LLM_TEMPERATURE },
        });
        let response = self
            .http
            .post(GEMINI_ENDPOINT)
            .query(&[("key", api_key)])
            .json(&payload)
            .send()
            .await
            .map_err(upstream)?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!("Gemini API error: {status} - {detail}")));
        }
        let body: Value = response.json().await.map_err(upstream)?;
        parse_gemini(&body)
    }
}

fn upstream(e: reqwest::Error) -> Error {
    Error::Upstream(e.to_string())
}

fn parse_my_memory(body: &Value) -> Result<String, Error> {
    // MyMemory embeds its real status in the body; the HTTP status is 200
    // even for quota errors.
    if body.get("responseStatus").and_then(Value::as_i64) != Some(200) {
        let detail = body
            .get("responseDetails")
            .and_then(Value::as_str)
            .unwrap_or("Translation failed");
        return Err(Error::Upstream(format!("MyMemory API error: {detail}")));
    }
    body.pointer("/responseData/translatedText")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| Error::Upstream("Invalid response from MyMemory".into()))
}

fn parse_lingva(body: &Value) -> Result<String, Error> {
    body.get("translation")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| Error::Upstream("Invalid response from Lingva".into()))
}

/// The web endpoint chunks long input: the first top-level array holds
/// `[translated, original, ...]` entries. Collect every leading string; zero
/// segments means the undocumented shape changed under us.
fn parse_google_segments(body: &Value) -> Result<String, Error> {
    let segments: Vec<&str> = body
        .get(0)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|item| item.get(0).and_then(Value::as_str)).collect())
        .unwrap_or_default();
    if segments.is_empty() {
        return Err(Error::Upstream("Invalid response from Google Translate".into()));
    }
    Ok(segments.concat())
}

fn parse_chat_completion(body: &Value) -> Result<String, Error> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_owned())
        .ok_or_else(|| Error::Upstream("Invalid response from DeepSeek".into()))
}

fn parse_gemini(body: &Value) -> Result<String, Error> {
    body.pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_owned())
        .ok_or_else(|| Error::Upstream("Invalid response from Gemini".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn provider_codes_deserialize() {
        for (code, expected) in [
            ("mymemory", Provider::MyMemory),
            ("lingva", Provider::Lingva),
            ("googletranslate", Provider::GoogleTranslate),
            ("deepseek", Provider::DeepSeek),
            ("gemini", Provider::Gemini),
        ] {
            let parsed: Provider = serde_json::from_value(json!(code)).unwrap();
            assert_eq!(parsed, expected);
            assert_eq!(parsed.as_str(), code);
        }
        assert!(serde_json::from_value::<Provider>(json!("babelfish")).is_err());
    }

    #[test]
    fn google_segments_are_concatenated() {
        let body = json!([
            [["Hello ", "Hallo ", null], ["world", "Welt", null]],
            null,
            "de"
        ]);
        assert_eq!(parse_google_segments(&body).unwrap(), "Hello world");
    }

    #[test]
    fn google_skips_non_string_leading_items() {
        let body = json!([[[42, "x"], ["ok", "y"]]]);
        assert_eq!(parse_google_segments(&body).unwrap(), "ok");
    }

    #[test]
    fn google_empty_first_array_is_invalid() {
        let err = parse_google_segments(&json!([[], null])).unwrap_err();
        assert!(matches!(err, Error::Upstream(m) if m.contains("Invalid response")));
    }

    #[test]
    fn google_non_array_body_is_invalid() {
        assert!(parse_google_segments(&json!({"translation": "x"})).is_err());
    }

    #[test]
    fn my_memory_happy_path() {
        let body = json!({
            "responseStatus": 200,
            "responseData": { "translatedText": "Bonjour" }
        });
        assert_eq!(parse_my_memory(&body).unwrap(), "Bonjour");
    }

    #[test]
    fn my_memory_embedded_error_is_surfaced() {
        let body = json!({
            "responseStatus": 403,
            "responseDetails": "DAILY QUOTA EXCEEDED"
        });
        let err = parse_my_memory(&body).unwrap_err();
        assert!(matches!(err, Error::Upstream(m) if m.contains("DAILY QUOTA EXCEEDED")));
    }

    #[test]
    fn lingva_missing_field_is_invalid() {
        assert!(parse_lingva(&json!({"info": {}})).is_err());
        assert_eq!(parse_lingva(&json!({"translation": "hola"})).unwrap(), "hola");
    }

    #[test]
    fn chat_completion_content_is_trimmed() {
        let body = json!({
            "choices": [{ "message": { "role": "assistant", "content": "  Hallo Welt \n" } }]
        });
        assert_eq!(parse_chat_completion(&body).unwrap(), "Hallo Welt");
    }

    #[test]
    fn gemini_text_is_extracted() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "Ciao\n" }] } }]
        });
        assert_eq!(parse_gemini(&body).unwrap(), "Ciao");
        assert!(parse_gemini(&json!({"candidates": []})).is_err());
    }

    #[tokio::test]
    async fn key_providers_fail_fast_without_keys() {
        // No outbound call is made: the adapter bails before building one.
        let translator = Translator::new(TranslateCfg::default());
        let err = translator.translate("hola", "es", "en", Provider::DeepSeek).await.unwrap_err();
        assert!(matches!(err, Error::Config(m) if m.contains("DeepSeek")));
        let err = translator.translate("hola", "es", "en", Provider::Gemini).await.unwrap_err();
        assert!(matches!(err, Error::Config(m) if m.contains("Gemini")));
    }
}
