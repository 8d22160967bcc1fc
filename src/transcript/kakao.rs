//! KakaoTalk export format
//!
//! PC export:
//!   --------------- 2024년 1월 5일 금요일 ---------------
//!   [홍길동] [오후 3:15] 메시지
//!
//! Mobile export:
//!   2024. 1. 5. 오후 3:15, 홍길동 : 메시지
//!
//! English-locale PC exports use `[Name] [3:15 PM]` and
//! `--------------- Friday, January 5, 2024 ---------------`.
//! Unmatched lines continue the previous message.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::{RawMessage, TranscriptFormat};
use crate::error::{AnalysisError, Result};

/// How many leading lines `detect` inspects
const DETECT_LINES: usize = 50;

static DATE_KO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-*\s*(\d{4})년 (\d{1,2})월 (\d{1,2})일 \S*요일\s*-*$").expect("valid regex")
});

static DATE_EN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-+\s*[A-Za-z]+, ([A-Za-z]+) (\d{1,2}), (\d{4})\s*-+$").expect("valid regex")
});

static PC_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\[(?P<sender>[^\]]+)\] \[(?:(?P<m1>오전|오후) (?P<h1>\d{1,2}):(?P<n1>\d{2})|(?P<h2>\d{1,2}):(?P<n2>\d{2}) (?P<m2>AM|PM))\] ?(?P<text>.*)$",
    )
    .expect("valid regex")
});

static MOBILE_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<y>\d{4})\. (?P<mo>\d{1,2})\. (?P<d>\d{1,2})\. (?P<m>오전|오후) (?P<h>\d{1,2}):(?P<n>\d{2}), (?P<sender>.+?) : (?P<text>.*)$",
    )
    .expect("valid regex")
});

/// Timestamped mobile line without a sender (joins, leaves, invites)
static MOBILE_EVENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}\. \d{1,2}\. \d{1,2}\. (오전|오후) \d{1,2}:\d{2}").expect("valid regex")
});

pub struct KakaoTalkFormat;

impl KakaoTalkFormat {
    pub fn new() -> Self {
        Self
    }
}

impl Default for KakaoTalkFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptFormat for KakaoTalkFormat {
    fn id(&self) -> &str {
        "kakao:Talk"
    }

    fn description(&self) -> &str {
        "KakaoTalk chat export (.txt, PC or mobile)"
    }

    fn detect(&self, text: &str) -> bool {
        text.lines()
            .take(DETECT_LINES)
            .any(|line| PC_MESSAGE.is_match(line.trim_end()) || MOBILE_MESSAGE.is_match(line.trim_end()))
    }

    fn parse(&self, text: &str) -> Result<Vec<RawMessage>> {
        let mut messages: Vec<RawMessage> = vec![];
        let mut current_date: Option<NaiveDate> = None;
        // Whether unmatched lines may be appended to the last message
        let mut continuing = false;

        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;
            let line = line.trim_start_matches('\u{feff}').trim_end_matches('\r');
            let trimmed = line.trim();

            if trimmed.is_empty() {
                continue;
            }

            if let Some(date) = parse_date_separator(trimmed) {
                current_date = Some(date);
                continuing = false;
                continue;
            }

            if let Some(caps) = MOBILE_MESSAGE.captures(trimmed) {
                let date = ymd(&caps["y"], &caps["mo"], &caps["d"], line_number)?;
                let time = korean_time(&caps["m"], &caps["h"], &caps["n"], line_number)?;
                current_date = Some(date);
                messages.push(RawMessage {
                    sender: caps["sender"].trim().to_string(),
                    timestamp: NaiveDateTime::new(date, time),
                    text: caps["text"].to_string(),
                });
                continuing = true;
                continue;
            }

            if MOBILE_EVENT.is_match(trimmed) {
                continuing = false;
                continue;
            }

            if let Some(caps) = PC_MESSAGE.captures(trimmed) {
                let date = current_date.ok_or_else(|| {
                    AnalysisError::Input(format!(
                        "line {}: message appears before any date header",
                        line_number
                    ))
                })?;
                let time = pc_time(&caps, line_number)?;
                messages.push(RawMessage {
                    sender: caps["sender"].trim().to_string(),
                    timestamp: NaiveDateTime::new(date, time),
                    text: caps["text"].to_string(),
                });
                continuing = true;
                continue;
            }

            if continuing {
                if let Some(last) = messages.last_mut() {
                    last.text.push('\n');
                    last.text.push_str(line);
                }
            }
            // Anything else is export header or a system notice
        }

        tracing::debug!(count = messages.len(), "parsed KakaoTalk transcript");
        Ok(messages)
    }
}

fn parse_date_separator(line: &str) -> Option<NaiveDate> {
    if let Some(caps) = DATE_KO.captures(line) {
        return ymd(&caps[1], &caps[2], &caps[3], 0).ok();
    }
    if let Some(caps) = DATE_EN.captures(line) {
        let text = format!("{} {} {}", &caps[1], &caps[2], &caps[3]);
        return NaiveDate::parse_from_str(&text, "%B %d %Y").ok();
    }
    None
}

fn ymd(year: &str, month: &str, day: &str, line_number: usize) -> Result<NaiveDate> {
    let parsed = (year.parse(), month.parse(), day.parse());
    if let (Ok(y), Ok(m), Ok(d)) = parsed {
        if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
            return Ok(date);
        }
    }
    Err(AnalysisError::Input(format!(
        "line {}: invalid date {}-{}-{}",
        line_number, year, month, day
    )))
}

fn pc_time(caps: &Captures, line_number: usize) -> Result<NaiveTime> {
    match (caps.name("m1"), caps.name("m2")) {
        (Some(meridiem), _) => korean_time(meridiem.as_str(), &caps["h1"], &caps["n1"], line_number),
        (None, Some(meridiem)) => {
            let korean = if meridiem.as_str() == "AM" { "오전" } else { "오후" };
            korean_time(korean, &caps["h2"], &caps["n2"], line_number)
        }
        (None, None) => Err(AnalysisError::Input(format!(
            "line {}: missing time of day",
            line_number
        ))),
    }
}

/// 오전 12:xx is just after midnight, 오후 12:xx just after noon
fn korean_time(meridiem: &str, hour: &str, minute: &str, line_number: usize) -> Result<NaiveTime> {
    let invalid = || {
        AnalysisError::Input(format!(
            "line {}: invalid time {} {}:{}",
            line_number, meridiem, hour, minute
        ))
    };
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&hour) {
        return Err(invalid());
    }
    let hour24 = match meridiem {
        "오전" => hour % 12,
        _ => hour % 12 + 12,
    };
    NaiveTime::from_hms_opt(hour24, minute, 0).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PC_EXPORT: &str = "\
철수 님과 카카오톡 대화
저장한 날짜 : 2024-01-10 12:00:00

--------------- 2024년 1월 5일 금요일 ---------------
[철수] [오후 3:15] 안녕
[영희] [오전 12:03] 뭐해
두 번째 줄
--------------- 2024년 1월 6일 토요일 ---------------
[민수] [오후 12:30] 점심
";

    #[test]
    fn test_parse_pc_export() {
        let format = KakaoTalkFormat::new();
        assert!(format.detect(PC_EXPORT));

        let messages = format.parse(PC_EXPORT).unwrap();
        assert_eq!(messages.len(), 3);

        assert_eq!(messages[0].sender, "철수");
        assert_eq!(messages[0].timestamp.to_string(), "2024-01-05 15:15:00");

        assert_eq!(messages[1].timestamp.to_string(), "2024-01-05 00:03:00");
        assert_eq!(messages[1].text, "뭐해\n두 번째 줄");

        assert_eq!(messages[2].sender, "민수");
        assert_eq!(messages[2].timestamp.to_string(), "2024-01-06 12:30:00");
    }

    #[test]
    fn test_parse_mobile_export() {
        let text = "\
2024년 2월 1일 목요일
2024. 2. 1. 오전 9:05, 지수 : 좋은 아침
2024. 2. 1. 오전 9:06: 지민님이 들어왔습니다.
2024. 2. 1. 오후 11:59, 지민 : 늦었다
";
        let format = KakaoTalkFormat::new();
        assert!(format.detect(text));

        let messages = format.parse(text).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, "지수");
        assert_eq!(messages[0].timestamp.to_string(), "2024-02-01 09:05:00");
        assert_eq!(messages[1].text, "늦었다");
        assert_eq!(messages[1].timestamp.to_string(), "2024-02-01 23:59:00");
    }

    #[test]
    fn test_parse_english_pc_export() {
        let text = "\
--------------- Friday, January 5, 2024 ---------------
[Sam] [9:41 PM] see you
";
        let messages = KakaoTalkFormat::new().parse(text).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].timestamp.to_string(), "2024-01-05 21:41:00");
    }

    #[test]
    fn test_message_before_date_header_fails() {
        let err = KakaoTalkFormat::new()
            .parse("[철수] [오후 3:15] 안녕\n")
            .unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_detect_rejects_json() {
        let text = r#"{"sender": "a", "timestamp": "2024-01-01 10:00", "text": "hi"}"#;
        assert!(!KakaoTalkFormat::new().detect(text));
    }
}
