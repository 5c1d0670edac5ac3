use ai_tutor::core::image::attach_image;
use ai_tutor::utils::error::TutorError;
use ai_tutor::utils::logger;
use ai_tutor::{Answer, CliConfig, CommandSpeechCapture, GeminiClient, Interaction, TutorEngine};
use clap::Parser;

fn report(e: &TutorError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.severity().exit_code());
}

async fn wait_for_ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        // 無法註冊訊號時不取消請求
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🎓 Starting AI-Powered Tutor");

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            report(&e);
        }
    };
    tracing::debug!("Resolved config: {:?}", config);

    if config.api_key.is_none() {
        tracing::warn!("⚠️ No API key found, set GEMINI_API_KEY or service.api_key");
    }

    let interaction = if cli.speak {
        if cli.question.is_some() {
            tracing::warn!("Ignoring typed question because --speak was given");
        }
        Interaction::Spoken
    } else {
        Interaction::Typed(cli.question.clone().unwrap_or_default())
    };

    let image = cli.image.as_ref().and_then(attach_image);

    let service = match GeminiClient::new(&config) {
        Ok(service) => service,
        Err(e) => report(&e),
    };
    tracing::info!("🤖 Using model {}", service.model());
    let speech = CommandSpeechCapture::new(
        config.speech.command.clone(),
        config.speech.args.clone(),
        config.speech.phrase_time_limit,
    );
    let engine = TutorEngine::new(service, speech, config.speech.listen_timeout);

    tracing::info!(
        "📚 Grade {} {} ({})",
        config.context.grade,
        config.context.subject,
        config.context.language
    );

    match engine
        .run_until_cancelled(interaction, &config.context, image.as_ref(), wait_for_ctrl_c())
        .await
    {
        Ok(Answer::Text(text)) => {
            println!("✅ AI Answer:");
            println!();
            println!("{}", text);
        }
        Ok(Answer::Blocked { reason }) => {
            eprintln!("⚠️ The AI Tutor could not answer this question ({})", reason);
            eprintln!("💡 Try rephrasing the question");
            std::process::exit(2);
        }
        Err(e) => report(&e),
    }

    Ok(())
}
