use radius_server::{AuthScheme, ClientChannel, ClientConfig, RadiusAuthenticator};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 4 {
        eprintln!("Usage: {} <username> <password> <secret> [server_addr] [pap|chap|mschap|mschapv2]", args[0]);
        eprintln!("Example: {} admin admin123 testing123 127.0.0.1:1812 mschapv2", args[0]);
        std::process::exit(1);
    }

    let username = &args[1];
    let password = &args[2];
    let secret = &args[3];
    let server_addr = args.get(4).map(|s| s.as_str()).unwrap_or("127.0.0.1:1812");
    let scheme = match args.get(5).map(|s| s.to_ascii_lowercase()).as_deref() {
        None | Some("pap") => AuthScheme::Pap,
        Some("chap") => AuthScheme::Chap,
        Some("mschap") => AuthScheme::MsChap,
        Some("mschapv2") => AuthScheme::MsChapV2,
        Some(other) => {
            eprintln!("Unknown scheme: {other}");
            std::process::exit(1);
        }
    };

    println!("RADIUS Client Test");
    println!("==================");
    println!("Server: {server_addr}");
    println!("Username: {username}");
    println!("Scheme: {scheme}");
    println!();

    let config = ClientConfig::new(server_addr.parse()?, secret.as_str())
        .with_request_timeout(Duration::from_secs(5));
    let channel = ClientChannel::new(config);
    let authenticator = RadiusAuthenticator::new(scheme).with_nas_identifier("simple-client");

    match authenticator.authenticate(&channel, username, password).await {
        Ok(attributes) => {
            println!("Authentication SUCCESSFUL");
            let dictionary = channel.codec().factory().dictionary();
            for attribute in attributes.iter() {
                println!("  {}", attribute.to_string_with(dictionary));
            }
        }
        Err(e) => {
            println!("Authentication FAILED: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}
