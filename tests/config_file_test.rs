use ai_tutor::config::toml_config::TomlConfig;
use ai_tutor::core::image::attach_image;
use ai_tutor::domain::model::{Language, Subject};
use ai_tutor::utils::validation::Validate;
use ai_tutor::{CommandSpeechCapture, GeminiClient, Interaction, ResolvedConfig, TutorEngine};
use anyhow::Result;
use httpmock::prelude::*;
use std::io::Write;
use tempfile::TempDir;

/// 從 TOML 檔案設定整個流程：模型、金鑰、預設年級/科目與語言
#[tokio::test]
async fn test_config_file_drives_request() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-2.0-flash:generateContent")
            .header("x-goog-api-key", "file-key")
            .body_contains("grade 10 students in Physics")
            .body_contains("Answer in Telugu.");
        then.status(200).json_body(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "Force = mass x acceleration"}]}}]
        }));
    });

    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("tutor.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[service]
endpoint = "{}"
model = "models/gemini-2.0-flash"
api_key = "file-key"
timeout_seconds = 10

[defaults]
grade = 10
subject = "Physics"
language = "Telugu"
answer_in_language = true
"#,
            server.base_url()
        ),
    )?;

    let file = TomlConfig::from_file(&config_path)?;
    file.validate()?;
    let config = ResolvedConfig::from_toml(&file, |_| None)?;
    config.validate()?;

    assert_eq!(config.context.subject, Subject::Physics);
    assert_eq!(config.context.language, Language::Telugu);

    let engine = TutorEngine::new(
        GeminiClient::new(&config)?,
        CommandSpeechCapture::new(
            config.speech.command.clone(),
            config.speech.args.clone(),
            config.speech.phrase_time_limit,
        ),
        config.speech.listen_timeout,
    );

    let answer = engine
        .run(
            Interaction::Typed("What is Newton's second law?".to_string()),
            &config.context,
            None,
        )
        .await?;

    api_mock.assert();
    assert_eq!(answer.as_text(), Some("Force = mass x acceleration"));
    Ok(())
}

/// 壞掉的圖片不能中斷提問
#[tokio::test]
async fn test_corrupt_image_is_dropped_and_question_still_asked() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-1.5-flash-latest:generateContent")
            .matches(|req| {
                let body = req.body.as_deref().unwrap_or_default();
                !String::from_utf8_lossy(body).contains("inline_data")
            });
        then.status(200).json_body(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "Here is the explanation."}]}}]
        }));
    });

    let temp_dir = TempDir::new()?;
    let image_path = temp_dir.path().join("homework.jpg");
    std::fs::File::create(&image_path)?.write_all(b"\xFF\xD8 truncated jpeg")?;

    let image = attach_image(&image_path);
    assert!(image.is_none());

    let file = TomlConfig::from_toml_str(&format!(
        "[service]\nendpoint = \"{}\"\napi_key = \"k\"\n",
        server.base_url()
    ))?;
    let config = ResolvedConfig::from_toml(&file, |_| None)?;
    let engine = TutorEngine::new(
        GeminiClient::new(&config)?,
        CommandSpeechCapture::new("true", vec![], config.speech.phrase_time_limit),
        config.speech.listen_timeout,
    );

    let answer = engine
        .run(
            Interaction::Typed("Explain my homework".to_string()),
            &config.context,
            image.as_ref(),
        )
        .await?;

    api_mock.assert();
    assert_eq!(answer.as_text(), Some("Here is the explanation."));
    Ok(())
}
