use agent::{AgentClient, AgentInvoker};
use clap::{Parser, Subcommand};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use server::ServerConfig;
use server::handlers::EXAMPLE_PROMPTS;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::error;
use tracing_subscriber::EnvFilter;

// UI関連の設定
const USER_NAME: &str = "User";
const AGENT_NAME: &str = "Agent";
const LOADING_ANIMATION_INTERVAL: u64 = 200;
const LOADING_ANIMATION_CHARACTER: &str = ".";
// ローディングアニメーションをクリアするためのスペース文字列
const CLEAR_LINE_SPACES: &str = "                                     "; // 37 spaces

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";
const DEFAULT_ADDRESS: &str = "0.0.0.0:5000";
const DOTENV_PATH: &str = ".env";

/// invoke 失敗時に表示する確認事項
const TROUBLESHOOTING_CHECKLIST: [&str; 4] = [
    "Your AWS credentials are valid",
    "You have permission to use Bedrock Agents",
    "The Agent ID and Alias ID are correct",
    "The region is correct",
];

// CLIの引数構造体定義
#[derive(Parser)]
#[command(name = "agent-cli")]
#[command(about = "Invoke an AWS Bedrock Agent from the command line or over HTTP", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// エージェントを一度だけ呼び出して結果を表示します
    Invoke {
        /// 送信するプロンプト（省略時は既定のプロンプト）
        #[arg(long)]
        prompt: Option<String>,
    },
    /// HTTPサーバーを起動します
    Serve {
        /// バインドアドレス
        #[arg(long, default_value = DEFAULT_ADDRESS)]
        address: String,
    },
    /// 対話型チャットを起動します
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // ログはstderrへ出力し、stdoutは結果表示に使う
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    // 引数の解析
    let cli = Cli::parse();

    // 必須の環境変数が欠けている場合はここで終了する（.env の値でも補える）
    let agent = AgentClient::from_env_file(DOTENV_PATH).await?;

    match cli.command {
        Commands::Invoke { prompt } => {
            let prompt = prompt.unwrap_or_else(|| EXAMPLE_PROMPTS[0].to_string());
            Ok(run_invoke(&agent, &prompt).await)
        }
        Commands::Serve { address } => {
            server::start_server(ServerConfig::new(address), Arc::new(agent)).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Chat => {
            run_chat(&agent).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// エージェントを一度だけ呼び出し、結果または確認事項を表示する
async fn run_invoke(agent: &AgentClient, prompt: &str) -> ExitCode {
    match agent.invoke(prompt).await {
        Ok(response) => {
            println!("Bedrock agent response:");
            println!("{}", "=".repeat(50));
            println!("{}", response);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Invocation failed: {}", e);
            println!("Error generating response: {}", e);
            println!("{}", troubleshooting_text());
            ExitCode::FAILURE
        }
    }
}

fn troubleshooting_text() -> String {
    let mut text = String::from("Check that:");
    for (i, item) in TROUBLESHOOTING_CHECKLIST.iter().enumerate() {
        text.push_str(&format!("\n{}. {}", i + 1, item));
    }
    text
}

/// CLI対話型チャットを実行する
///
/// 1行ごとに独立した呼び出しを行う。会話の文脈は引き継がない。
async fn run_chat(agent: &AgentClient) -> anyhow::Result<()> {
    // rustylineエディタの初期化（UI層）
    let mut rl = DefaultEditor::new()?;

    println!("Agent ID: {}", agent.agent_id());
    println!("Region:   {}", agent.region());
    print_examples();
    println!("+------------------------------------------------------------------+");
    println!("| Agent chat started. Type 'examples' for ideas, 'exit' to stop.   |");
    println!("+------------------------------------------------------------------+");

    loop {
        let readline = rl.readline(&format!("{} > ", USER_NAME));
        match readline {
            Ok(line) => {
                let input = line.trim();

                // 空入力はスキップ
                if input.is_empty() {
                    continue;
                }

                if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
                    break;
                }

                if input.eq_ignore_ascii_case("examples") {
                    print_examples();
                    continue;
                }

                let _ = rl.add_history_entry(input);

                print!("{} > ", AGENT_NAME);
                std::io::stdout().flush()?;

                // ローディングアニメーション開始
                let loading_task = tokio::spawn(async {
                    loop {
                        sleep(Duration::from_millis(LOADING_ANIMATION_INTERVAL)).await;
                        print!("{}", LOADING_ANIMATION_CHARACTER);
                        if std::io::stdout().flush().is_err() {
                            break;
                        }
                    }
                });

                let result = agent.invoke(input).await;
                loading_task.abort();
                clear_loading_animation();

                match result {
                    Ok(response) => println!("{}", response),
                    Err(e) => println!("\n[Error] {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

fn print_examples() {
    println!("Example prompts:");
    for example in EXAMPLE_PROMPTS {
        println!("  - {}", example);
    }
}

/// ローディングアニメーションをクリアしてカーソルを戻す
fn clear_loading_animation() {
    print!(
        "\r{} > {}\r{} > ",
        AGENT_NAME, CLEAR_LINE_SPACES, AGENT_NAME
    );
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_invoke_prompt_is_optional() {
        let cli = Cli::try_parse_from(["agent-cli", "invoke"]).unwrap();
        assert!(matches!(cli.command, Commands::Invoke { prompt: None }));

        let cli = Cli::try_parse_from(["agent-cli", "invoke", "--prompt", "hi"]).unwrap();
        match cli.command {
            Commands::Invoke { prompt } => assert_eq!(prompt.as_deref(), Some("hi")),
            _ => panic!("Invokeが選択されるべき"),
        }
    }

    #[test]
    fn test_serve_default_address() {
        let cli = Cli::try_parse_from(["agent-cli", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { address } => assert_eq!(address, DEFAULT_ADDRESS),
            _ => panic!("Serveが選択されるべき"),
        }
    }

    #[test]
    fn test_troubleshooting_text_is_numbered() {
        let text = troubleshooting_text();
        assert!(text.starts_with("Check that:"));
        assert!(text.contains("1. Your AWS credentials are valid"));
        assert!(text.contains("4. The region is correct"));
    }
}
