use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};

const VERIFIER_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
const VERIFIER_LENGTH: usize = 64;

/// Proof Key for Code Exchange parameters (RFC 7636, `S256`).
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

impl PkceChallenge {
    pub const METHOD: &'static str = "S256";

    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let verifier: String = (0..VERIFIER_LENGTH)
            .map(|_| VERIFIER_CHARSET[rng.random_range(0..VERIFIER_CHARSET.len())] as char)
            .collect();
        let challenge = Self::challenge_for(&verifier);

        Self {
            verifier,
            challenge,
        }
    }

    pub fn challenge_for(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc7636_example() {
        // Appendix B of RFC 7636.
        assert_eq!(
            PkceChallenge::challenge_for("dBjftJeZ4CVP-1mXGKqOgmNU9xvUbVuL6bEsK1RmXNw"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGKSEw-cM"
        );
    }

    #[test]
    fn test_generated_verifier_matches_challenge() {
        let pkce = PkceChallenge::generate();
        assert_eq!(pkce.verifier.len(), VERIFIER_LENGTH);
        assert_eq!(pkce.challenge, PkceChallenge::challenge_for(&pkce.verifier));
        assert_ne!(pkce.verifier, PkceChallenge::generate().verifier);
    }
}
