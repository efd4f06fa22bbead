use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Route {
    Html(String),
    Bytes(Vec<u8>),
    Redirect(String),
    Status(u16),
}

/// Local stand-in for the catalog site. Unknown paths answer 404.
pub struct CatalogStub {
    pub base_url: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CatalogStub {
    pub fn spawn(routes: HashMap<String, Route>) -> Self {
        Self::spawn_at("127.0.0.1:0", routes)
    }

    /// Serve on a fixed address, e.g. one handed out by [free_local_addr].
    pub fn spawn_at(addr: &str, routes: HashMap<String, Route>) -> Self {
        let server = tiny_http::Server::http(addr).expect("start catalog stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");
        let hits: Arc<Mutex<HashMap<String, usize>>> = Arc::default();
        let server_hits = Arc::clone(&hits);

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            let request = match server.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(req)) => req,
                Ok(None) => continue,
                Err(_) => break,
            };

            let url = request.url().to_string();
            *server_hits
                .lock()
                .expect("lock hits")
                .entry(url.clone())
                .or_insert(0) += 1;

            let response = match routes.get(&url) {
                Some(Route::Html(body)) => tiny_http::Response::from_string(body.clone()),
                Some(Route::Bytes(bytes)) => tiny_http::Response::from_data(bytes.clone()),
                Some(Route::Redirect(location)) => {
                    // The generic page parses fine; only the redirect marks it as missing.
                    tiny_http::Response::from_string(detail_page(
                        "Moved - Site",
                        "/shots/generic.jpg",
                        &[],
                        &[],
                    ))
                    .with_status_code(302)
                    .with_header(
                        tiny_http::Header::from_bytes(&b"Location"[..], location.as_bytes())
                            .expect("location header"),
                    )
                }
                Some(Route::Status(code)) => {
                    tiny_http::Response::from_string("error").with_status_code(*code)
                }
                None => tiny_http::Response::from_string("not found").with_status_code(404),
            };
            let _ = request.respond(response);
        });

        Self {
            base_url,
            hits,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Number of requests served for `path` (including query).
    pub fn hits(&self, path: &str) -> usize {
        self.hits
            .lock()
            .expect("lock hits")
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}

/// A loopback address nothing listens on yet. Connections to it are refused until a
/// stub is spawned there.
pub fn free_local_addr() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    let addr = listener.local_addr().expect("local addr");
    addr.to_string()
}

impl Drop for CatalogStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn detail_page(title: &str, image_src: &str, genres: &[&str], comments: &[&str]) -> String {
    let genre_links: Vec<String> = genres
        .iter()
        .map(|g| format!(r#"<a href="/l55/">{g}</a>"#))
        .collect();
    let comment_divs: String = comments
        .iter()
        .map(|c| format!(r#"<div class="texts"><b>reader</b><br><span class="black">{c}</span></div>"#))
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html>
  <head><title>{title}</title></head>
  <body>
    <table class="d_book"><tr><td>
      <div class="bookimage"><a href="/b1/"><img src="{image_src}" alt="cover"></a></div>
    </td></tr></table>
    <span class="d_book"><b>Жанр книги:</b> {genres}</span>
    {comments}
  </body>
</html>
"#,
        genres = genre_links.join(", "),
        comments = comment_divs,
    )
}

pub fn listing_page(ids: &[u32]) -> String {
    let cards: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<table class="d_book"><tr><td><div class="bookimage"><a href="/b{id}/"><img src="/shots/{id}.jpg"></a></div></td></tr></table>"#
            )
        })
        .collect();
    format!("<!DOCTYPE html><html><head><title>Научная фантастика</title></head><body>{cards}</body></html>")
}
