//! Maps agent failures to user-facing explanations.
//!
//! Matching is a case-insensitive search over `"<Type>: <message>"` against an
//! ordered table. The first entry that matches wins, so table order is the
//! only tie-break when a message mentions several failure signatures.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::errors::AgentError;

/// Maximum number of characters of the raw failure kept for display.
pub const MAX_ORIGINAL_ERROR_CHARS: usize = 500;

/// Title used when no known failure signature matches.
pub const UNKNOWN_ERROR_TITLE: &str = "❗ 오류 발생";

const UNKNOWN_ERROR_SOLUTION: &str = "에러 메시지를 확인하고 문제를 해결해주세요.";

/// One entry of the classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPattern {
    pub pattern: &'static str,
    pub title: &'static str,
    pub message: &'static str,
    pub solution: &'static [&'static str],
}

/// Known failure signatures in priority order.
pub const ERROR_PATTERNS: &[ErrorPattern] = &[
    ErrorPattern {
        pattern: r"AuthenticationError.*API key|openai.*api.*key|OPENAI_API_KEY",
        title: "🔑 OpenAI API Key 오류",
        message: "OpenAI API 키가 설정되지 않았거나 유효하지 않습니다.",
        solution: &[
            "환경변수 `OPENAI_API_KEY`를 설정하거나 클라이언트 초기화 시 `api_key` 파라미터를 전달하세요.",
            "API 키 발급: https://platform.openai.com/api-keys",
        ],
    },
    ErrorPattern {
        pattern: r"RateLimitError|rate_limit|429",
        title: "⏱️ Rate Limit 초과",
        message: "API 요청 한도를 초과했습니다.",
        solution: &["잠시 후 다시 시도하거나, API 사용량 및 요금제를 확인하세요."],
    },
    ErrorPattern {
        pattern: r"InsufficientQuotaError|insufficient_quota|billing",
        title: "💳 크레딧 부족",
        message: "API 크레딧이 부족합니다.",
        solution: &["API 제공자의 결제 페이지에서 크레딧을 충전하세요."],
    },
    ErrorPattern {
        pattern: r"InvalidRequestError|invalid_request",
        title: "❌ 잘못된 요청",
        message: "API 요청 형식이 올바르지 않습니다.",
        solution: &["입력 데이터와 모델명이 올바른지 확인하세요."],
    },
    ErrorPattern {
        pattern: r"anthropic.*authentication|ANTHROPIC_API_KEY",
        title: "🔑 Anthropic API Key 오류",
        message: "Anthropic API 키가 설정되지 않았거나 유효하지 않습니다.",
        solution: &[
            "환경변수 `ANTHROPIC_API_KEY`를 설정하세요.",
            "API 키 발급: https://console.anthropic.com/",
        ],
    },
    ErrorPattern {
        pattern: r"google.*api.*key|GOOGLE_API_KEY",
        title: "🔑 Google API Key 오류",
        message: "Google API 키가 설정되지 않았거나 유효하지 않습니다.",
        solution: &[
            "환경변수 `GOOGLE_API_KEY`를 설정하세요.",
            "API 키 발급: https://aistudio.google.com/apikey",
        ],
    },
    ErrorPattern {
        pattern: r"ConnectionError|connection.*refused|network",
        title: "🌐 네트워크 오류",
        message: "API 서버에 연결할 수 없습니다.",
        solution: &["인터넷 연결 및 방화벽/프록시 설정을 확인하세요."],
    },
    ErrorPattern {
        pattern: r"TimeoutError|timeout|timed out",
        title: "⏰ 시간 초과",
        message: "API 요청이 시간 초과되었습니다.",
        solution: &["네트워크 연결을 확인하고 잠시 후 다시 시도하세요."],
    },
    ErrorPattern {
        pattern: r"model.*not.*found|does not exist|invalid.*model",
        title: "🤖 모델 오류",
        message: "지정된 모델을 찾을 수 없습니다.",
        solution: &["모델명과 접근 권한을 확인하세요."],
    },
];

static COMPILED_PATTERNS: Lazy<Vec<(Regex, &'static ErrorPattern)>> = Lazy::new(|| {
    ERROR_PATTERNS
        .iter()
        .map(|entry| {
            let regex = RegexBuilder::new(entry.pattern)
                .case_insensitive(true)
                .build()
                .expect("valid error pattern regex");
            (regex, entry)
        })
        .collect()
});

/// User-facing explanation of a failure.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClassifiedError {
    /// Whether a known failure signature matched.
    pub matched: bool,
    pub title: String,
    pub message: String,
    /// Remediation steps, in display order.
    pub solution: Vec<String>,
    /// Prefix of the `"<Type>: <message>"` text, at most 500 characters.
    pub original_error: String,
}

/// Classifies a failure given its type name and message.
pub fn classify(error_type: &str, message: &str) -> ClassifiedError {
    let composite = format!("{error_type}: {message}");
    let original_error = truncate_chars(&composite, MAX_ORIGINAL_ERROR_CHARS);

    let hit = COMPILED_PATTERNS
        .iter()
        .find(|(regex, _)| regex.is_match(&composite))
        .map(|(_, entry)| *entry);

    match hit {
        Some(entry) => ClassifiedError {
            matched: true,
            title: entry.title.to_string(),
            message: entry.message.to_string(),
            solution: entry.solution.iter().map(|s| (*s).to_string()).collect(),
            original_error,
        },
        None => ClassifiedError {
            matched: false,
            title: UNKNOWN_ERROR_TITLE.to_string(),
            message: error_type.to_string(),
            solution: vec![UNKNOWN_ERROR_SOLUTION.to_string()],
            original_error,
        },
    }
}

/// Classifies an agent runtime failure.
pub fn classify_error(err: &AgentError) -> ClassifiedError {
    classify(err.error_type(), err.message())
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
