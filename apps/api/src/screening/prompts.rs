// Screening prompt. The template instructs the model to return pure JSON;
// the normalizer still assumes it may not comply.

/// Substituted when the caller provides no job requirements.
pub const DEFAULT_JOB_REQUIREMENTS: &str =
    "General screening - look for red flags and strengths";

/// Screening prompt template. Replace `{resume_text}` and
/// `{job_requirements}` before sending.
pub const SCREENING_PROMPT_TEMPLATE: &str = r#"You are an expert resume screener. Analyze this resume against the job requirements.

Resume: {resume_text}

Job Requirements: {job_requirements}

Provide your analysis in EXACTLY this JSON format (no markdown, just pure JSON):
{
    "score": <integer from 1-10>,
    "summary": "<2-sentence summary of the candidate>",
    "strengths": ["<strength1>", "<strength2>", "<strength3>"],
    "concerns": ["<concern1>", "<concern2>"],
    "match_percentage": <integer from 0-100>
}

Be harsh but fair. Look for real experience, not just keywords.
Only return the JSON, nothing else."#;

/// Renders the screening prompt. Pure; the caller is responsible for
/// truncating `resume_text` beforehand.
pub fn build_prompt(resume_text: &str, job_requirements: &str) -> String {
    let requirements = if job_requirements.trim().is_empty() {
        DEFAULT_JOB_REQUIREMENTS
    } else {
        job_requirements
    };
    SCREENING_PROMPT_TEMPLATE
        .replace("{resume_text}", resume_text)
        .replace("{job_requirements}", requirements)
}
