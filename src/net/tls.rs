//! CA certificate loading for endpoint connections.

use std::path::Path;

/// Load a PEM encoded CA certificate to trust for one endpoint.
pub fn load_root_certificate(path: &Path) -> Result<reqwest::Certificate, std::io::Error> {
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("CA certificate file not found: {:?}", path),
        ));
    }

    let pem = std::fs::read(path)?;
    reqwest::Certificate::from_pem(&pem)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = load_root_certificate(Path::new("/nonexistent/ca.pem")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
