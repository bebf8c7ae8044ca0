use tally_core::{Message, Target};

/// One parsed line from a producer.
#[derive(Debug, Clone, PartialEq)]
pub enum ProducerEvent {
    /// A well-formed command, ready for the dashboard bus.
    Command(Message),
    /// A known command whose data could not be used.
    Malformed { command: String, reason: String },
    /// A command we don't handle. Carries the raw line for debugging.
    Unknown(String),
}

/// Parse a raw producer line into a typed [`ProducerEvent`].
///
/// Commands have the format `command>>data`, e.g. `increment>>OK,3` or
/// `series>>X,0.12,0.08,0.11`.
pub fn parse_line(line: &str) -> ProducerEvent {
    let line = line.trim();
    let Some((command, data)) = line.split_once(">>") else {
        return ProducerEvent::Unknown(line.to_string());
    };
    let data = data.trim();

    let parsed = match command {
        "increment" => parse_labeled(data, 1u64).map(|(label, amount)| {
            Message::Increment { label, amount }
        }),
        "series" => parse_series(data),
        "capacity" => data
            .parse::<usize>()
            .map(Message::SetCapacity)
            .map_err(|e| format!("bad capacity '{data}': {e}")),
        "pie" => parse_labeled_required::<f64>(data).map(|(label, value)| {
            Message::PieSet { label, value }
        }),
        "pieincrement" => parse_labeled(data, 1.0f64).map(|(label, amount)| {
            Message::PieIncrement { label, amount }
        }),
        "gauge" => parse_labeled_required::<f64>(data).map(|(label, value)| {
            Message::Gauge { label, value }
        }),
        "reset" => match data {
            "counters" => Ok(Message::Reset(Target::Counters)),
            "series" => Ok(Message::Reset(Target::Series)),
            "pie" => Ok(Message::Reset(Target::Pie)),
            other => Err(format!("cannot reset '{other}'")),
        },
        "export" => parse_export(data).map(Message::Export),
        _ => return ProducerEvent::Unknown(line.to_string()),
    };

    match parsed {
        Ok(message) => ProducerEvent::Command(message),
        Err(reason) => ProducerEvent::Malformed {
            command: command.to_string(),
            reason,
        },
    }
}

/// `LABEL[,VALUE]`, with `default` when the value is omitted.
fn parse_labeled<T>(data: &str, default: T) -> Result<(String, T), String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let (label, value) = match data.split_once(',') {
        Some((label, value)) => {
            let value = value
                .trim()
                .parse::<T>()
                .map_err(|e| format!("bad value '{}': {e}", value.trim()))?;
            (label.trim(), value)
        }
        None => (data, default),
    };
    if label.is_empty() {
        return Err("missing label".into());
    }
    Ok((label.to_string(), value))
}

/// `LABEL,VALUE` where the value is mandatory.
fn parse_labeled_required<T>(data: &str) -> Result<(String, T), String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some((label, value)) = data.split_once(',') else {
        return Err(format!("expected LABEL,VALUE in '{data}'"));
    };
    let value = value
        .trim()
        .parse::<T>()
        .map_err(|e| format!("bad value '{}': {e}", value.trim()))?;
    let label = label.trim();
    if label.is_empty() {
        return Err("missing label".into());
    }
    Ok((label.to_string(), value))
}

/// `AXIS,v1,v2,...` with at least one value.
fn parse_series(data: &str) -> Result<Message, String> {
    let mut fields = data.split(',').map(str::trim);
    let axis = fields.next().unwrap_or_default();
    if axis.is_empty() {
        return Err("missing axis".into());
    }
    let samples = fields
        .map(|f| f.parse::<f64>().map_err(|e| format!("bad sample '{f}': {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    if samples.is_empty() {
        return Err(format!("no samples for axis '{axis}'"));
    }
    Ok(Message::SetAxis {
        axis: axis.to_string(),
        samples,
    })
}

fn parse_export(data: &str) -> Result<Target, String> {
    match data {
        "axes" | "series" => Ok(Target::Series),
        "counters" => Ok(Target::Counters),
        "pie" => Ok(Target::Pie),
        "snapshot" => Ok(Target::Snapshot),
        other => match other.split_once(':') {
            Some(("series", axis)) if !axis.trim().is_empty() => {
                Ok(Target::Axis(axis.trim().to_string()))
            }
            _ => Err(format!("cannot export '{other}'")),
        },
    }
}
