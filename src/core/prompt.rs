use crate::domain::model::{Context, EncodedImage, MultimodalRequest, Question};

/// 組合給模型的指示文字
pub fn build_instruction(question: &Question, context: &Context) -> String {
    let mut instruction = format!(
        "You are a helpful tutor for grade {} students in {}.\nExplain in simple terms.\n",
        context.grade, context.subject
    );
    if context.answer_in_language {
        instruction.push_str(&format!("Answer in {}.\n", context.language));
    }
    instruction.push_str("Question: ");
    instruction.push_str(question.as_str());
    instruction
}

/// Packages the instruction and the optional image into a single user turn.
/// Pure and deterministic; the question text is embedded verbatim.
pub fn assemble(
    question: &Question,
    context: &Context,
    image: Option<&EncodedImage>,
) -> MultimodalRequest {
    MultimodalRequest::new(build_instruction(question, context), image)
}
