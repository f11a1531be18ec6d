//! CSV and printable HTML exports of stored readings

use chrono::{TimeZone, Utc};
use csv::Writer;
use storage::SensorRecord;

use crate::error::ApiError;

pub const CSV_HEADERS: [&str; 9] = [
    "Date/Time",
    "PM10 (μg/m³)",
    "PM2.5 (μg/m³)",
    "CO2 (ppm)",
    "Humidity (%)",
    "Temperature (°C)",
    "AQI",
    "AQI Level",
    "Location",
];

/// Format a Unix-ms timestamp as `YYYY-MM-DD HH:MM:SS` (UTC)
pub fn format_timestamp(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn export_error(e: impl std::fmt::Display) -> ApiError {
    ApiError::Internal(format!("CSV export failed: {}", e))
}

/// Export readings to CSV
pub fn readings_to_csv(readings: &[SensorRecord]) -> Result<String, ApiError> {
    let mut writer = Writer::from_writer(vec![]);
    writer.write_record(CSV_HEADERS).map_err(export_error)?;

    for r in readings {
        writer
            .write_record([
                format_timestamp(r.recorded_at_ms),
                format!("{:.2}", r.pm10),
                format!("{:.2}", r.pm25),
                format!("{:.0}", r.co2),
                format!("{:.1}", r.humidity),
                format!("{:.1}", r.temperature),
                r.aqi_value.to_string(),
                r.aqi_level.clone(),
                r.location_name.clone().unwrap_or_else(|| "N/A".to_string()),
            ])
            .map_err(export_error)?;
    }

    let bytes = writer.into_inner().map_err(export_error)?;
    String::from_utf8(bytes).map_err(export_error)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render a printable HTML report
pub fn readings_to_html(readings: &[SensorRecord], generated_at_ms: i64) -> String {
    let rows: String = readings
        .iter()
        .map(|r| {
            format!(
                "<tr><td>{}</td><td>{:.2} μg/m³</td><td>{:.2} μg/m³</td><td>{:.0} ppm</td>\
                 <td>{:.1}%</td><td>{:.1}°C</td><td>{}</td><td>{}</td></tr>\n",
                format_timestamp(r.recorded_at_ms),
                r.pm10,
                r.pm25,
                r.co2,
                r.humidity,
                r.temperature,
                r.aqi_value,
                escape_html(&r.aqi_level),
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Air Quality Report</title>
<style>
body {{ font-family: Arial, sans-serif; padding: 20px; }}
h1 {{ color: #333; border-bottom: 2px solid #4a90e2; padding-bottom: 10px; }}
table {{ width: 100%; border-collapse: collapse; margin-top: 20px; }}
th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}
th {{ background-color: #4a90e2; color: white; }}
tr:nth-child(even) {{ background-color: #f2f2f2; }}
.footer {{ margin-top: 30px; font-size: 12px; color: #666; }}
</style>
</head>
<body>
<h1>Air Quality Monitoring Report</h1>
<p>Generated on: {generated}</p>
<p>Total Records: {count}</p>
<table>
<thead>
<tr><th>Date/Time</th><th>PM10</th><th>PM2.5</th><th>CO2</th><th>Humidity</th><th>Temperature</th><th>AQI</th><th>Level</th></tr>
</thead>
<tbody>
{rows}</tbody>
</table>
<div class="footer"><p>Air Quality Monitoring System</p></div>
</body>
</html>
"#,
        generated = format_timestamp(generated_at_ms),
        count = readings.len(),
        rows = rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(location: Option<&str>) -> SensorRecord {
        SensorRecord {
            id: 1,
            pm10: 45.678,
            pm25: 12.0,
            co2: 451.6,
            humidity: 55.55,
            temperature: 24.04,
            aqi_value: 50,
            aqi_level: "good".to_string(),
            location_lat: None,
            location_lng: None,
            location_name: location.map(str::to_string),
            created_by: None,
            recorded_at_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_csv_shape() {
        let csv = readings_to_csv(&[reading(None), reading(Some("Pune"))]).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Date/Time,PM10 (μg/m³),PM2.5 (μg/m³),CO2 (ppm),Humidity (%),Temperature (°C),AQI,AQI Level,Location"
        );
        assert_eq!(lines[1], "2023-11-14 22:13:20,45.68,12.00,452,55.5,24.0,50,good,N/A");
        assert!(lines[2].ends_with(",Pune"));
    }

    #[test]
    fn test_html_report() {
        let html = readings_to_html(&[reading(None)], 1_700_000_000_000);
        assert!(html.contains("Total Records: 1"));
        assert!(html.contains("<td>45.68 μg/m³</td>"));
        assert!(html.contains("Generated on: 2023-11-14 22:13:20"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_html("<b>&"), "&lt;b&gt;&amp;");
    }
}
