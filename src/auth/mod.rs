//! 署名付き接続URIの生成
//!
//! エンドポイントパスと全クエリパラメータ（辞書順ソート、`&` 連結）に
//! 対する HMAC-SHA1 署名を base64 + URLエンコードして付加します。
//! 生成は (現在時刻, 乱数ノンス, 鍵, 無音パラメータ) の純関数です。
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha1::Sha1;
use uuid::Uuid;

use crate::config::EndpointConfig;
use crate::session::EndpointProvider;

type HmacSha1 = Hmac<Sha1>;

/// セッション相関用の不透明ID（UUIDv4のURLセーフbase64、パディングなし）
pub fn make_uid() -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes())
}

/// エンドポイント設定から署名付きURIを組み立てるビルダ
#[derive(Debug, Clone)]
pub struct SignedUriBuilder {
    config: EndpointConfig,
}

impl SignedUriBuilder {
    pub fn new(config: EndpointConfig) -> Self {
        Self { config }
    }

    /// 現在時刻・新規voice_id・乱数ノンスで署名付きURIを生成
    pub fn build(&self, vad_silence_ms: u32) -> String {
        let now = Utc::now().timestamp();
        let expired = now + self.config.expiry_secs;
        let voice_id = make_uid();
        let nonce = rand::rng().random_range(100_000..1_000_000);
        self.build_with(now, expired, &voice_id, nonce, vad_silence_ms)
    }

    fn build_with(
        &self,
        timestamp: i64,
        expired: i64,
        voice_id: &str,
        nonce: u32,
        vad_silence_ms: u32,
    ) -> String {
        let mut params = vec![
            format!("engine_model_type={}", self.config.engine_model_type),
            format!("needvad={}", self.config.needvad),
            format!("timestamp={timestamp}"),
            format!("vad_silence={vad_silence_ms}"),
            format!("secretid={}", self.config.secret_id),
            format!("expired={expired}"),
            format!("voice_id={voice_id}"),
            format!("voice_format={}", self.config.voice_format),
            format!("nonce={nonce}"),
        ];
        // 署名対象はパラメータ文字列の辞書順
        params.sort();
        let data = params.join("&");

        let signature = self.sign(&format!("{}{}", self.config.sign_path, data));
        let signature = urlencoding::encode(&signature);

        format!("{}{}&signature={}", self.config.base_url, data, signature)
    }

    fn sign(&self, message: &str) -> String {
        let mut mac = HmacSha1::new_from_slice(self.config.secret_key.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(message.as_bytes());
        general_purpose::STANDARD.encode(mac.finalize().into_bytes())
    }
}

impl EndpointProvider for SignedUriBuilder {
    fn signed_uri(&self, vad_silence_ms: u32) -> String {
        self.build(vad_silence_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(secret_key: &str) -> EndpointConfig {
        EndpointConfig {
            base_url: "wss://asr.cloud.tencent.com/asr/v2/1259304765?".to_string(),
            sign_path: "asr.cloud.tencent.com/asr/v2/1259304765?".to_string(),
            engine_model_type: "16k_zh".to_string(),
            voice_format: 1,
            needvad: 1,
            secret_id: "AKIDtest".to_string(),
            secret_key: secret_key.to_string(),
            expiry_secs: 86_400,
        }
    }

    #[test]
    fn uid_is_22_urlsafe_chars() {
        let uid = make_uid();
        assert_eq!(uid.len(), 22);
        assert!(uid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn uids_are_unique_per_call() {
        assert_ne!(make_uid(), make_uid());
    }

    #[test]
    fn params_are_sorted_and_signature_appended_last() {
        let builder = SignedUriBuilder::new(test_config("test-key"));
        let uri = builder.build_with(1_700_000_000, 1_700_086_400, "abc123", 123_456, 240);

        let query = uri.split_once('?').unwrap().1;
        let keys: Vec<&str> = query
            .split('&')
            .map(|pair| pair.split_once('=').unwrap().0)
            .collect();
        let mut sorted = keys[..keys.len() - 1].to_vec();
        sorted.sort_unstable();
        assert_eq!(&keys[..keys.len() - 1], &sorted[..]);
        assert_eq!(keys.last(), Some(&"signature"));
    }

    #[test]
    fn known_signature_vector() {
        let builder = SignedUriBuilder::new(test_config("test-key"));
        let uri = builder.build_with(1_700_000_000, 1_700_086_400, "abc123", 123_456, 240);
        assert_eq!(
            uri,
            "wss://asr.cloud.tencent.com/asr/v2/1259304765?\
             engine_model_type=16k_zh&expired=1700086400&needvad=1&nonce=123456\
             &secretid=AKIDtest&timestamp=1700000000&vad_silence=240\
             &voice_format=1&voice_id=abc123\
             &signature=oZl1e%2B%2FZqP0xemhvFuFb0x%2FbzRM%3D"
        );
    }

    #[test]
    fn empty_secret_key_still_signs() {
        let builder = SignedUriBuilder::new(test_config(""));
        let uri = builder.build_with(1_700_000_000, 1_700_086_400, "abc123", 123_456, 240);
        assert!(uri.ends_with("&signature=NSAJ5uYL6EdGnk638QYnwpUXii4%3D"));
    }
}
