use actix_files::Files;
use actix_web::{App, HttpServer};

/// Serves `tests/static/` on an ephemeral port and returns its base URL.
///
/// Files that do not exist are answered with 404, which the crawler treats
/// as a normal response.
pub async fn get_test_server_url() -> String {
    let http_server = HttpServer::new(|| {
        App::new().service(Files::new("/", "tests/static/").index_file("index.html"))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("Failed to bind test server");

    let addr = http_server
        .addrs()
        .first()
        .cloned()
        .expect("No address bound");
    let url = format!("http://{}", addr);

    let app_server = http_server.run();

    tokio::spawn(async move {
        if let Err(e) = app_server.await {
            eprintln!("Test server error: {}", e);
        }
    });

    url
}

/// A URL on the loopback interface that refuses connections
#[allow(dead_code)]
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    drop(listener);
    format!("http://{}", addr)
}
