use opserver_engine::error::LoadError;
use opserver_engine::image_loader::{HttpImageLoader, ImageLoader};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve one canned HTTP response on a local port.
///
/// Returns the base URL and a receiver for the request line the client sent.
async fn serve_once(response: &'static [u8]) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (request_tx, request_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let request = String::from_utf8_lossy(&request);
        let request_line = request.lines().next().unwrap_or_default().to_string();
        let _ = request_tx.send(request_line);

        stream.write_all(response).await.unwrap();
        stream.shutdown().await.unwrap();
    });

    (format!("http://{}", addr), request_rx)
}

fn direct_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

fn loader() -> HttpImageLoader {
    HttpImageLoader::new().with_client(direct_client())
}

#[tokio::test]
async fn test_image_response_loads() {
    let (base, _) = serve_once(
        b"HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\nContent-Length: 4\r\nConnection: close\r\n\r\n\xff\xd8\xff\xe0",
    )
    .await;

    let loader = loader();
    assert_eq!(loader.load(&format!("{}/avatar.jpg", base)).await, Ok(()));
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let (base, _) = serve_once(
        b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    )
    .await;

    let loader = loader();
    assert_eq!(
        loader.load(&format!("{}/missing.jpg", base)).await,
        Err(LoadError::Status(404))
    );
}

#[tokio::test]
async fn test_html_response_is_not_an_image() {
    let (base, _) = serve_once(
        b"HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: 13\r\nConnection: close\r\n\r\n<h1>login</h1",
    )
    .await;

    let loader = loader();
    assert_eq!(
        loader.load(&format!("{}/avatar.jpg", base)).await,
        Err(LoadError::NotAnImage("text/html; charset=utf-8".into()))
    );
}

#[tokio::test]
async fn test_empty_image_body_rejected() {
    let (base, _) = serve_once(
        b"HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    )
    .await;

    let loader = loader();
    assert_eq!(
        loader.load(&format!("{}/avatar.png", base)).await,
        Err(LoadError::EmptyBody)
    );
}

#[tokio::test]
async fn test_missing_content_type_accepted() {
    let (base, _) = serve_once(
        b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\n\x89PNG",
    )
    .await;

    let loader = loader();
    assert_eq!(loader.load(&format!("{}/avatar", base)).await, Ok(()));
}

#[tokio::test]
async fn test_relative_candidate_hits_origin() {
    let (base, request_rx) = serve_once(
        b"HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\nContent-Length: 2\r\nConnection: close\r\n\r\n\xff\xd8",
    )
    .await;

    let loader = HttpImageLoader::with_origin(&base)
        .unwrap()
        .with_client(direct_client());
    assert_eq!(loader.load("/api/steam-avatar/abc_medium.jpg").await, Ok(()));
    assert_eq!(
        request_rx.await.unwrap(),
        "GET /api/steam-avatar/abc_medium.jpg HTTP/1.1"
    );
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let loader = loader();
    let result = loader.load(&format!("http://{}/avatar.jpg", addr)).await;
    assert!(matches!(result, Err(LoadError::Network(_))), "got {:?}", result);
}
