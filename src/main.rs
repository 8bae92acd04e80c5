use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use vto_common::{find_template, templates, AppState, Controller, GarmentDescriptor, GarmentRef, TemplateGarment};
use vto_studio::{cli, client, config, error, photo};
use cli::{Cli, Commands};
use client::VtoClient;
use config::Config;
use error::StudioError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let config = Config::load()?;
    let service = config.service_config(cli.base_url.as_deref());
    log::debug!("service: {:?}", service);
    let client = VtoClient::new(service)?;

    match cli.command {
        Commands::Process { photo, template, garment, download, json } => {
            println!("👗 vto-studio - 試着処理\n");

            let mut controller = Controller::new();

            // 1. 写真
            println!("[1/3] 写真を読み込み中...");
            let selected = photo::load_photo(&photo).await?;
            println!("✔ {} ({} bytes)\n", selected.filename, selected.size());
            controller.select_photo(selected);

            // 2. 衣服
            println!("[2/3] 衣服を選択中...");
            let chosen = match (template, garment) {
                (Some(id), _) => Some(find_template(id).ok_or(StudioError::UnknownTemplate(id))?),
                (None, Some(name)) => Some(resolve_server_garment(&client, &name).await?),
                (None, None) => None,
            };
            if let Some(chosen) = chosen {
                println!("✔ {} (id={})\n", chosen.display_name, chosen.id);
                controller.select_template(chosen);
            }

            let request = controller.begin_processing()?;

            // 3. 送信
            println!("[3/3] 送信中...");
            let bar = upload_bar(request.photo.size() as u64);
            let progress = bar.clone();
            let outcome = client
                .process_photos(&request.photo, &request.template, move |p| {
                    progress.set_position(p.loaded);
                    if p.percent() >= 100 {
                        progress.set_message("Procesando en el servidor...");
                    } else {
                        progress.set_message(format!("Subida: {}%", p.percent()));
                    }
                })
                .await;
            bar.finish_and_clear();
            controller.finish(outcome);

            match controller.state() {
                AppState::Succeeded(result) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(result)?);
                    } else {
                        println!("✅ {}", result.message);
                        println!("  画像: {}", result.image_url);
                        println!("  正規URL: {}", result.original_url);
                        if let Some(name) = &result.metadata.clothe_name {
                            println!("  衣服: {}", name);
                        }
                        if let Some(model) = &result.metadata.model_type {
                            println!("  モデル: {}", model);
                        }
                    }

                    if let Some(dest) = download {
                        let saved = client.download_result(&result.image_url, &dest).await?;
                        println!("✔ 保存: {}", saved.display());
                    }
                }
                AppState::Failed(message) => {
                    anyhow::bail!("❌ {}", message);
                }
                AppState::Idle | AppState::Processing => {
                    anyhow::bail!("unexpected state: {}", controller.state().as_str());
                }
            }
        }

        Commands::Templates => {
            println!("ギャラリー:");
            for t in templates() {
                println!("  {:>2}  {:<16} {}", t.id, t.display_name, t.asset_url);
            }
        }

        Commands::Clothes => {
            let clothes = client.get_available_clothes().await?;
            println!("{}件の衣服:", clothes.len());
            for c in &clothes {
                let id = c.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
                println!(
                    "  {:>3}  {:<20} {}",
                    id,
                    c.name,
                    c.category.as_deref().unwrap_or("")
                );
            }
        }

        Commands::Health => {
            let health = client.check_server_health().await;
            if health.is_healthy {
                println!("✅ サーバー正常");
            } else {
                println!("⚠ サーバー異常: {}", health.error.as_deref().unwrap_or("not healthy"));
            }
            println!("  検出器: {}", if health.detector_ready { "準備完了" } else { "未準備" });
            println!("  衣服数: {}", health.clothe_count);
            if let Some(performance) = &health.performance {
                println!("  性能: {}", performance);
            }
        }

        Commands::Metrics => {
            let metrics = client.get_server_metrics().await?;
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }

        Commands::Download { url, output } => {
            let dest = output
                .or_else(|| config.download_dir.clone())
                .unwrap_or_else(|| PathBuf::from("."));
            let saved = client
                .download_result(&url, &dest)
                .await
                .with_context(|| format!("download of {}", url))?;
            println!("✔ 保存: {}", saved.display());
        }

        Commands::Config { set_base_url, show } => {
            let mut config = config;

            if let Some(url) = set_base_url {
                config.set_base_url(url)?;
                println!("✔ ベースURLを設定しました");
            }

            if show {
                let service = config.service_config(None);
                println!("設定:");
                println!("  ベースURL: {}", service.base_url);
                println!("  処理タイムアウト: {}s", service.process_timeout_ms / 1000);
                println!("  確認タイムアウト: {}s", service.check_timeout_ms / 1000);
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

/// サーバーカタログから名前で衣服を探し、テンプレートとして扱う
///
/// カタログに無い名前でも、名前の数字からIDが決まれば送信できる。
async fn resolve_server_garment(client: &VtoClient, name: &str) -> error::Result<TemplateGarment> {
    let descriptor = match client.get_available_clothes().await {
        Ok(clothes) => clothes
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name)),
        Err(e) => {
            log::warn!("{}", e);
            None
        }
    }
    .unwrap_or_else(|| GarmentDescriptor {
        name: name.to_string(),
        ..Default::default()
    });

    let id = descriptor.clothe_id()?;
    Ok(TemplateGarment {
        id,
        display_name: descriptor.name,
        asset_url: String::new(),
    })
}

fn upload_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {bytes}/{total_bytes} {msg}") {
        bar.set_style(style.progress_chars("=>-"));
    }
    bar
}
