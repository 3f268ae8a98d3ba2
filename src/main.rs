use std::io::{self, BufRead, Write};

use responsablesd::{cache, config, ipc, store};

fn main() {
    dotenv::dotenv().ok();

    let config = config::Config::from_env();
    // No store, no useful interaction: a connection failure here is fatal.
    let store = match store::open(&config) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("responsablesd: {e}");
            std::process::exit(1);
        }
    };

    let mut state = ipc::AppState {
        store,
        cache: cache::StoreCache::new(),
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply with the request id; send a best-effort notice.
                let _ = writeln!(
                    stdout,
                    "{{\"ok\":false,\"error\":{{\"code\":\"bad_json\",\"message\":\"{}\"}}}}",
                    e
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
