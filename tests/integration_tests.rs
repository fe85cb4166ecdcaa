//! End-to-end tests against an in-process HTTP backend.
//! The fake speaks just enough HTTP/1.1 to stand in for the agent service.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use serde_json::{Value, json};
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};
    use utf8path::Path;

    use ragchat::chat::CHAT_ERROR_TEXT;
    use ragchat::{
        Backend, ChatSession, HistoryEntry, Sender, SessionId, Transport, UploadStatus, Uploader,
    };

    const OK: &str = "200 OK";
    const NOT_FOUND: &str = "404 Not Found";
    const SERVER_ERROR: &str = "500 Internal Server Error";

    #[derive(Default)]
    struct BackendState {
        sessions: HashMap<String, Vec<Value>>,
        chat_bodies: Vec<Value>,
        uploads: Vec<String>,
        fail_clear: bool,
    }

    struct FakeBackend {
        url: String,
        state: Arc<Mutex<BackendState>>,
    }

    impl FakeBackend {
        async fn start() -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = format!("http://{}", listener.local_addr().unwrap());
            let state = Arc::new(Mutex::new(BackendState::default()));
            let shared = Arc::clone(&state);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let state = Arc::clone(&shared);
                    tokio::spawn(async move {
                        let _ = serve(stream, state).await;
                    });
                }
            });
            Self { url, state }
        }

        fn client(&self) -> Arc<Backend> {
            Arc::new(Backend::new(&self.url).unwrap())
        }

        fn seed(&self, session_id: &str, entries: Vec<Value>) {
            self.state
                .lock()
                .unwrap()
                .sessions
                .insert(session_id.to_string(), entries);
        }

        fn stored(&self, session_id: &str) -> Vec<Value> {
            self.state
                .lock()
                .unwrap()
                .sessions
                .get(session_id)
                .cloned()
                .unwrap_or_default()
        }
    }

    async fn serve(stream: TcpStream, state: Arc<Mutex<BackendState>>) -> std::io::Result<()> {
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).await?;
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let target = parts.next().unwrap_or_default().to_string();

        let mut content_length = 0;
        let mut chunked = false;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await?;
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                let value = value.trim();
                match name.trim().to_ascii_lowercase().as_str() {
                    "content-length" => content_length = value.parse().unwrap_or(0),
                    "transfer-encoding" => chunked = value.eq_ignore_ascii_case("chunked"),
                    _ => {}
                }
            }
        }

        let body = if chunked {
            read_chunked(&mut reader).await?
        } else {
            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).await?;
            body
        };

        let (status, payload) = route(&method, &target, &body, &state);
        let payload = payload.to_string();
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{payload}",
            payload.len()
        );
        let mut stream = reader.into_inner();
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await
    }

    async fn read_chunked(reader: &mut BufReader<TcpStream>) -> std::io::Result<Vec<u8>> {
        let mut body = Vec::new();
        loop {
            let mut size = String::new();
            reader.read_line(&mut size).await?;
            let size = usize::from_str_radix(size.trim(), 16).unwrap_or(0);
            if size == 0 {
                let mut trailer = String::new();
                reader.read_line(&mut trailer).await?;
                return Ok(body);
            }
            let mut chunk = vec![0; size];
            reader.read_exact(&mut chunk).await?;
            body.extend_from_slice(&chunk);
            let mut crlf = String::new();
            reader.read_line(&mut crlf).await?;
        }
    }

    fn route(
        method: &str,
        target: &str,
        body: &[u8],
        state: &Mutex<BackendState>,
    ) -> (&'static str, Value) {
        let mut state = state.lock().unwrap();
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let session_id = url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "session_id")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_else(|| "default".to_string());

        match (method, path) {
            ("POST", "/upload") => {
                let text = String::from_utf8_lossy(body);
                let file_name = text
                    .split("filename=\"")
                    .nth(1)
                    .and_then(|rest| rest.split('"').next())
                    .unwrap_or_default()
                    .to_string();
                if file_name.ends_with(".pdf") && !text.contains("%PDF") {
                    return (SERVER_ERROR, json!({"detail": "Ingestion failed internally."}));
                }
                state.uploads.push(file_name);
                (OK, json!({"message": "File processed and saved successfully."}))
            }
            ("GET", "/api/history") => {
                let history = state.sessions.get(&session_id).cloned().unwrap_or_default();
                (OK, json!({ "history": history }))
            }
            ("DELETE", "/api/history") => {
                if state.fail_clear {
                    return (SERVER_ERROR, json!({"detail": "history store unavailable"}));
                }
                if let Some(history) = state.sessions.get_mut(&session_id) {
                    history.clear();
                }
                (OK, json!({"message": "History cleared"}))
            }
            ("POST", "/api/chat") => {
                let request: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
                let message = request["message"].as_str().unwrap_or_default().to_string();
                let session_id = request["session_id"]
                    .as_str()
                    .unwrap_or("default")
                    .to_string();
                state.chat_bodies.push(request);
                let answer = format!("echo: {message}");
                let history = state.sessions.entry(session_id).or_default();
                history.push(json!({"role": "user", "content": message}));
                history.push(json!({"role": "assistant", "content": answer}));
                (
                    OK,
                    json!({
                        "response": answer,
                        "retrieved_context": format!("passage about {message}"),
                    }),
                )
            }
            _ => (NOT_FOUND, json!({"detail": "Not Found"})),
        }
    }

    #[tokio::test]
    async fn chat_round_trip_over_http() {
        let server = FakeBackend::start().await;
        let mut session = ChatSession::new(server.client(), SessionId::from("lab 4"));

        assert!(session.send("hello").await.is_replied());
        assert!(session.send("what is faiss?").await.is_replied());
        session.settle().await;

        let bot = &session.messages()[1];
        assert_eq!(bot.sender, Sender::Bot);
        assert_eq!(bot.text, "echo: hello");
        assert_eq!(bot.context.as_deref(), Some("passage about hello"));

        let bodies = server.state.lock().unwrap().chat_bodies.clone();
        assert_eq!(bodies[0]["history"], json!([]));
        assert_eq!(bodies[0]["session_id"], json!("lab 4"));
        assert_eq!(
            bodies[1]["history"],
            json!([
                {"role": "user", "content": "hello"},
                {"role": "assistant", "content": "echo: hello"},
            ])
        );

        assert_eq!(session.full_history().len(), 4);
        assert_eq!(session.full_history()[3], HistoryEntry::assistant("echo: what is faiss?"));
    }

    #[tokio::test]
    async fn reload_hydrates_from_saved_history() {
        let server = FakeBackend::start().await;
        server.seed(
            "default",
            vec![
                json!({"role": "user", "content": "earlier question"}),
                json!({"role": "assistant", "content": "earlier answer"}),
                json!({"role": "user", "content": "dangling question"}),
            ],
        );

        let mut session = ChatSession::new(server.client(), SessionId::default());
        session.mount();
        session.settle().await;

        let senders: Vec<Sender> = session.messages().iter().map(|m| m.sender).collect();
        assert_eq!(senders, vec![Sender::User, Sender::Bot, Sender::User]);
        assert_eq!(session.full_history().len(), 3);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn clear_over_http() {
        let server = FakeBackend::start().await;
        let mut session = ChatSession::new(server.client(), SessionId::default());
        session.send("hello").await;
        session.settle().await;

        server.state.lock().unwrap().fail_clear = true;
        let err = session.clear().await.unwrap_err();
        assert!(err.is_clear());
        assert_eq!(err.status_code(), Some(500));
        assert!(err.to_string().contains("history store unavailable"));
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.full_history().len(), 2);

        server.state.lock().unwrap().fail_clear = false;
        session.clear().await.unwrap();
        assert!(session.messages().is_empty());
        assert!(session.history().is_empty());
        assert!(session.full_history().is_empty());
        assert!(server.stored("default").is_empty());
    }

    #[tokio::test]
    async fn history_panel_over_http() {
        let server = FakeBackend::start().await;
        server.seed(
            "default",
            vec![json!({"role": "system", "content": "be brief"})],
        );
        let mut session = ChatSession::new(server.client(), SessionId::default());

        session.open_history_panel().await.unwrap();
        assert!(session.toggles().show_history_panel());
        assert_eq!(session.full_history()[0].role.as_str(), "system");
        assert!(session.messages().is_empty());

        session.clear().await.unwrap();
        assert_eq!(session.history_panel(), Some(&[][..]));

        session.send("hello").await;
        session.settle().await;
        assert_eq!(
            session.history_panel(),
            Some(&[HistoryEntry::user("hello"), HistoryEntry::assistant("echo: hello")][..])
        );
    }

    #[tokio::test]
    async fn backend_down() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let mut session = ChatSession::new(Arc::new(Backend::new(&url).unwrap()), SessionId::default());
        session.mount();
        session.settle().await;
        assert!(session.messages().is_empty());

        let outcome = session.send("hello").await;
        assert!(!outcome.is_replied());
        assert_eq!(session.messages()[1].text, CHAT_ERROR_TEXT);
        assert!(session.history().is_empty());
        assert!(!session.is_loading());

        let err = session.open_history_panel().await.unwrap_err();
        assert!(err.is_history_fetch());
        assert!(err.is_connection());
    }

    #[tokio::test]
    async fn upload_over_http() {
        let server = FakeBackend::start().await;
        let dir = std::env::temp_dir().join(format!("ragchat-it-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let notes = dir.join("notes.txt");
        std::fs::write(&notes, b"FAISS stores dense vectors.").unwrap();
        let broken = dir.join("broken.pdf");
        std::fs::write(&broken, b"not a pdf").unwrap();
        let notes = Path::from(notes.to_str().unwrap().to_string());
        let broken = Path::from(broken.to_str().unwrap().to_string());

        let backend = server.client();
        let transport: &dyn Transport = backend.as_ref();
        let mut uploader = Uploader::new();

        assert!(uploader.select(notes));
        assert_eq!(uploader.upload(transport).await, Some(UploadStatus::Succeeded));
        assert_eq!(server.state.lock().unwrap().uploads, vec!["notes.txt".to_string()]);

        assert!(uploader.select(broken));
        assert_eq!(uploader.upload(transport).await, Some(UploadStatus::Failed));
    }
}
