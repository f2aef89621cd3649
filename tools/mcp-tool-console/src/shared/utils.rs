use std::time::Instant;

use time::{
    OffsetDateTime, PrimitiveDateTime, format_description::FormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

use crate::shared::types::CreateTime;

const DISPLAY_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const ISO_LOCAL_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

pub async fn measure_latency<F, Fut, T, E>(f: F) -> Result<(T, u64), E>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let start = Instant::now();
    let res = f().await?;
    let elapsed = start.elapsed().as_millis() as u64;
    Ok((res, elapsed))
}

/// Render a backend timestamp as `YYYY-MM-DD HH:mm:ss` (UTC for epoch
/// values). Returns `None` when the value cannot be interpreted.
pub fn format_create_time(value: &CreateTime) -> Option<String> {
    let parsed = match value {
        CreateTime::Millis(ms) => {
            let nanos = i128::from(*ms) * 1_000_000;
            let dt = OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()?;
            PrimitiveDateTime::new(dt.date(), dt.time())
        }
        CreateTime::Text(text) => parse_text_time(text.trim())?,
    };
    parsed.format(DISPLAY_FORMAT).ok()
}

fn parse_text_time(text: &str) -> Option<PrimitiveDateTime> {
    if let Ok(dt) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(PrimitiveDateTime::new(dt.date(), dt.time()));
    }
    // Java backends commonly send second precision, sometimes with a fraction.
    let seconds = text.split('.').next().unwrap_or(text);
    PrimitiveDateTime::parse(seconds, DISPLAY_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(seconds, ISO_LOCAL_FORMAT))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CreateTime::Millis(0), Some("1970-01-01 00:00:00"))]
    #[case(CreateTime::Millis(1_700_000_000_000), Some("2023-11-14 22:13:20"))]
    #[case(CreateTime::Text("2025-03-01 08:15:00".into()), Some("2025-03-01 08:15:00"))]
    #[case(CreateTime::Text("2025-03-01T08:15:00".into()), Some("2025-03-01 08:15:00"))]
    #[case(CreateTime::Text("2025-03-01T08:15:00.123".into()), Some("2025-03-01 08:15:00"))]
    #[case(CreateTime::Text("2025-03-01T08:15:00Z".into()), Some("2025-03-01 08:15:00"))]
    #[case(CreateTime::Text("yesterday".into()), None)]
    fn formats_create_time(#[case] input: CreateTime, #[case] expected: Option<&str>) {
        assert_eq!(format_create_time(&input).as_deref(), expected);
    }

    #[tokio::test]
    async fn measure_latency_passes_value_through() {
        let (value, _elapsed) = measure_latency(|| async { Ok::<_, ()>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }
}
