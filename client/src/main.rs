mod trans_client;

use log::*;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use trans_client::{ClientTarget, TransClient};
use xchat::{Client, Message, Received};

const DEFAULT_ADDR: &str = "tcp:127.0.0.1:9000";
const ADDR_ENV: &str = "XCHAT_ADDR";

const MENU: &str = "
===== ChatClient =====
1) Unary
2) Server Stream
3) Client Stream
4) Bidirectional Stream
5) Exit
----------------------";

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let addr = std::env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let target: ClientTarget = match addr.parse() {
        Ok(target) => target,
        Err(e) => {
            error!("Invalid {}: {}", ADDR_ENV, e);
            std::process::exit(2);
        }
    };

    let channel = match TransClient::new(target).connect().await {
        Ok(channel) => channel,
        Err(e) => {
            error!("Failed to connect: {}", e);
            std::process::exit(1);
        }
    };
    let client = Client::new(channel);

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", MENU);

    loop {
        let Some(choice) = prompt(&mut input, "Select> ").await else {
            break;
        };

        match choice.trim() {
            "1" => {
                let Some(text) = prompt(&mut input, "Enter text for Unary> ").await else {
                    break;
                };
                do_unary(&client, text).await;
            }
            "2" => {
                let Some(text) = prompt(&mut input, "Enter text for Server Stream> ").await else {
                    break;
                };
                do_server_stream(&client, text).await;
            }
            "3" => {
                println!("Enter texts for Client Stream (empty line to finish):");
                let texts = read_batch(&mut input).await;
                do_client_stream(&client, texts).await;
            }
            "4" => {
                println!("Enter texts for BiDi Stream (empty line to finish send):");
                let texts = read_batch(&mut input).await;
                do_bidi_stream(&client, texts).await;
            }
            "5" => {
                println!("Bye!");
                return;
            }
            _ => println!("Invalid choice"),
        }
    }
}

/// Prints `label` and reads one line; `None` on end of input.
async fn prompt(input: &mut Input, label: &str) -> Option<String> {
    let mut stdout = tokio::io::stdout();
    let _ = stdout.write_all(label.as_bytes()).await;
    let _ = stdout.flush().await;
    match input.next_line().await {
        Ok(line) => line,
        Err(e) => {
            error!("Failed to read input: {}", e);
            None
        }
    }
}

/// Reads lines until an empty one (or end of input).
async fn read_batch(input: &mut Input) -> Vec<String> {
    let mut texts = Vec::new();
    while let Some(line) = prompt(input, "> ").await {
        if line.is_empty() {
            break;
        }
        texts.push(line);
    }
    texts
}

async fn do_unary(client: &Client, text: String) {
    match client.unary(Message::new(text)).await {
        Ok(response) => println!("Unary Response: {}\n", response.body()),
        Err(e) => error!("Unary error: {}", e),
    }
}

async fn do_server_stream(client: &Client, text: String) {
    let mut responses = match client.server_stream(Message::new(text)).await {
        Ok(responses) => responses,
        Err(e) => {
            error!("ServerStream error: {}", e);
            return;
        }
    };

    println!("Server Stream Responses:");
    loop {
        match responses.next().await {
            Ok(Some(message)) => println!("  - {}", message.body()),
            Ok(None) => break,
            Err(e) => {
                error!("Recv error: {}", e);
                return;
            }
        }
    }
    println!();
}

async fn do_client_stream(client: &Client, texts: Vec<String>) {
    match client
        .client_stream(texts.into_iter().map(Message::new))
        .await
    {
        Ok(response) => println!("Client Stream Response: {}\n", response.body()),
        Err(e) => error!("ClientStream error: {}", e),
    }
}

async fn do_bidi_stream(client: &Client, texts: Vec<String>) {
    let stream = match client.open_bidi().await {
        Ok(stream) => stream,
        Err(e) => {
            error!("BiDiStream error: {}", e);
            return;
        }
    };
    let (mut receiver, mut sender) = stream.split();

    // Responses are printed as they arrive, interleaved with the sends.
    let printer = tokio::spawn(async move {
        loop {
            match receiver.receive().await {
                Ok(Received::Message(message)) => println!("  << {}", message.body()),
                Ok(Received::EndOfStream) => break,
                Err(e) => {
                    error!("Recv error: {}", e);
                    break;
                }
            }
        }
    });

    let exchange = async {
        for text in texts {
            println!("  >> {}", text);
            if let Err(e) = sender.send(Message::new(text)).await {
                error!("Send error: {}", e);
                break;
            }
        }
        if let Err(e) = sender.close_send().await {
            error!("CloseSend error: {}", e);
        }
    };

    let budget = client.call_config().bidi_timeout;
    if tokio::time::timeout(budget, exchange).await.is_err() {
        error!("BiDiStream error: deadline exceeded while sending");
        printer.abort();
    }
    let _ = printer.await;
    println!();
}
