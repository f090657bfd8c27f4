//! Title cleaning and topical relevance checks applied to every scraped
//! candidate before it can become an event record.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::MIN_TITLE_CHARS;

static DISALLOWED_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s가-힣\[\]()<>]").expect("disallowed chars regex"));

/// Generic, navigational, legal and geographic fragments that never name an
/// event on their own.
pub const DENYLIST: &[&str] = &[
    "더보기", "이전", "다음", "닫기", "보기", "이벤트", "EVENT",
    "사업자정보확인", "당첨자발표", "당첨자", "발표", "확인",
    "공지사항", "안내", "알림", "정보", "관련", "문의",
    "고객센터", "고객지원", "고객서비스", "고객안내",
    "이용약관", "개인정보처리방침", "개인정보", "약관",
    "로그인", "회원가입", "마이페이지", "예매", "예약",
    "상영시간", "상영관", "영화관", "극장", "매장",
    "홈", "메인", "메뉴", "검색", "찾기", "바로가기",
    "새창", "팝업", "레이어", "모달", "다이얼로그",
    "버튼", "링크", "클릭", "터치", "스와이프",
    "로딩", "로드", "업로드", "다운로드", "업데이트", "새로고침",
    "copyright", "all rights reserved",
    "주식회사", "㈜", "(주)", "유한회사", "(유)",
    "corporation", "company", "inc", "ltd", "co",
    "서울", "부산", "대구", "인천", "광주", "대전", "울산",
    "강남", "강북", "강서", "강동", "서초", "송파",
    "마포", "영등포", "용산", "성동", "광진", "동대문",
    "중랑", "성북", "도봉", "노원", "은평",
    "양천", "구로", "금천", "동작", "관악",
    "경기", "세종", "충북", "충남", "전북", "전남", "경북", "경남", "제주",
];

/// Keywords that mark a title as belonging to the film-event domain.
pub const RELEVANCE_KEYWORDS: &[&str] = &[
    "시사회", "프리미어", "개봉", "상영", "영화", "무비", "movie",
    "감독", "배우", "주연", "조연", "출연", "연출", "제작",
    "스틸컷", "포스터", "예고편", "트레일러", "메이킹",
    "인터뷰", "토크", "팬미팅", "사인회", "오프라인",
    "굿즈", "기념품", "포토카드", "포토존", "체험",
    "이벤트", "행사", "프로모션", "캠페인", "콘서트",
    "페스티벌", "영화제", "어워드", "시상식", "수상",
    "특별", "한정", "단독", "독점", "최초", "최고",
    "블라인드", "미리보기", "시연", "체험관", "전시",
    "갤러리", "박물관", "아카이브", "컬렉션", "전시회",
    "premiere", "screening", "preview", "giveaway", "merch", "goods",
    "festival", "actor", "director", "cinema", "film", "imax", "4dx",
    "trailer", "poster", "award", "fan meeting",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DenylistMode {
    /// Reject only when the whole title equals a denylisted term.
    Exact,
    /// Reject when any denylisted term appears anywhere in the title.
    #[default]
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitlePolicy {
    pub denylist: DenylistMode,
    pub require_relevance: bool,
    pub min_chars: usize,
}

impl Default for TitlePolicy {
    fn default() -> Self {
        Self {
            denylist: DenylistMode::Substring,
            require_relevance: true,
            min_chars: MIN_TITLE_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TitleRejection {
    #[error("shorter than {min} characters")]
    TooShort { min: usize },
    #[error("matches denylisted term {0:?}")]
    Denylisted(&'static str),
    #[error("digits and punctuation only")]
    NumericOnly,
    #[error("symbols only")]
    SymbolOnly,
    #[error("not topically relevant")]
    Irrelevant,
}

/// Strips characters outside the allowed set and rejects boilerplate.
pub fn clean_title(raw: &str, policy: &TitlePolicy) -> Result<String, TitleRejection> {
    let stripped = DISALLOWED_CHARS_RE.replace_all(raw, "");
    let title = stripped.trim();

    let min = policy.min_chars.max(MIN_TITLE_CHARS);
    if title.chars().count() < min {
        return Err(TitleRejection::TooShort { min });
    }

    let lowered = title.to_lowercase();
    let hit = DENYLIST.iter().copied().find(|term| {
        let term = term.to_lowercase();
        match policy.denylist {
            DenylistMode::Exact => lowered == term,
            DenylistMode::Substring => lowered.contains(&term),
        }
    });
    if let Some(term) = hit {
        return Err(TitleRejection::Denylisted(term));
    }

    // brackets and `_` survive cleaning, so look for an actual letter
    if !title.chars().any(char::is_alphabetic) {
        if title.chars().any(char::is_numeric) {
            return Err(TitleRejection::NumericOnly);
        }
        return Err(TitleRejection::SymbolOnly);
    }

    Ok(title.to_string())
}

pub fn is_topically_relevant(title: &str) -> bool {
    let lowered = title.to_lowercase();
    RELEVANCE_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(&keyword.to_lowercase()))
}

/// Cleans a raw title and, when the policy asks for it, requires relevance.
pub fn accept_title(raw: &str, policy: &TitlePolicy) -> Result<String, TitleRejection> {
    let title = clean_title(raw, policy)?;
    if policy.require_relevance && !is_topically_relevant(&title) {
        return Err(TitleRejection::Irrelevant);
    }
    Ok(title)
}
