//! Run as a CGI script, or by hand with CGI variables set:
//!
//! ```sh
//! REQUEST_METHOD=GET HTTP_HOST=localhost REQUEST_URI=/hello?name=micro \
//!     cargo run --example dump_request
//! ```

use micro_message::globals::RawGlobals;
use micro_message::protocol::ServerRequest;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).with_writer(std::io::stderr).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let request = match ServerRequest::from_globals(RawGlobals::from_env()) {
        Ok(request) => request,
        Err(e) => {
            error!(cause = %e, "failed to build request");
            println!("Status: 400 Bad Request\r\n\r\n{e}");
            return;
        }
    };

    info!(method = %request.method(), uri = %request.uri(), "request received");

    println!("Content-Type: text/plain\r\n\r");
    println!("{} {} HTTP/{}", request.method(), request.request_target(), request.protocol_version());
    for (name, values) in request.headers() {
        println!("{name}: {}", values.join(", "));
    }

    let mut query: Vec<_> = request.query_params().iter().collect();
    query.sort();
    for (name, value) in query {
        println!("query {name} = {value}");
    }

    match request.parsed_body() {
        Ok(Some(body)) => println!("body: {body:?}"),
        Ok(None) => println!("body: <none>"),
        Err(e) => error!(cause = %e, "failed to read body"),
    }
}
