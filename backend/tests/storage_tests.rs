use inkwell_api::{
    handlers::gallery::gallery_object_key,
    storage::{MockStorageService, S3StorageClient, StorageService, sanitize_key},
};

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_success() {
        let mock = MockStorageService::new();
        let key = "gallery/cover.png";
        let url = mock
            .get_presigned_upload_url(key, "image/png")
            .await
            .unwrap();

        assert!(url.contains("signature=fake"));
        assert!(url.contains(key));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockStorageService::new_failing();
        assert!(
            mock.get_presigned_upload_url("gallery/a.png", "image/png")
                .await
                .is_err()
        );
        assert!(mock.delete_object("gallery/a.png").await.is_err());
        assert!(mock.deleted_keys().is_empty());
    }

    #[tokio::test]
    async fn test_mock_sanitization() {
        let mock = MockStorageService::new();
        let url = mock
            .get_presigned_upload_url("../../etc/passwd", "text/plain")
            .await
            .unwrap();
        assert!(!url.contains(".."));
    }

    #[tokio::test]
    async fn test_mock_records_deleted_keys_across_clones() {
        let mock = MockStorageService::new();
        let shared = mock.clone();
        shared.delete_object("gallery/one.png").await.unwrap();
        shared.delete_object("/gallery/./two.png").await.unwrap();

        assert_eq!(
            mock.deleted_keys(),
            vec!["gallery/one.png", "gallery/two.png"]
        );
    }
}

#[cfg(test)]
mod key_tests {
    use super::*;

    #[test]
    fn sanitize_drops_traversal_segments() {
        assert_eq!(sanitize_key("a/../b/./c//d"), "a/b/c/d");
        assert_eq!(sanitize_key("../../"), "");
    }

    #[test]
    fn gallery_keys_keep_simple_extensions() {
        let key = gallery_object_key("Holiday Photo.JPG");
        assert!(key.starts_with("gallery/"));
        assert!(key.ends_with(".jpg"));

        let key = gallery_object_key("archive.tar.g$z");
        assert!(key.ends_with(".bin"));

        let key = gallery_object_key("no-extension");
        assert!(key.ends_with(".bin"));

        assert_ne!(gallery_object_key("a.png"), gallery_object_key("a.png"));
    }
}

#[cfg(test)]
mod s3_tests {
    use super::*;

    #[test]
    fn test_s3_client_creation() {
        let _client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
        );
    }

    #[tokio::test]
    async fn test_s3_presigning_is_offline() {
        // Presigning is a local signature computation; no request reaches the endpoint.
        let client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
        );
        let url = client
            .get_presigned_upload_url("gallery/x.png", "image/png")
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:9000/testbucket/gallery/x.png"));
        assert!(url.contains("X-Amz-Signature"));
    }
}
