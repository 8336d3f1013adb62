use serde::{Deserialize, Serialize};

// Open-Meteo reports `null` for any slot it has no reading for, so every
// measured value is optional.

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub current: ForecastCurrent,
    pub daily: ForecastDaily,
    pub hourly: ForecastHourly,
}

#[derive(Debug, Deserialize)]
pub struct ForecastCurrent {
    pub time: String,
    pub temperature_2m: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub is_day: Option<u8>,
    pub weather_code: Option<u16>,
    pub wind_speed_10m: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastDaily {
    pub time: Vec<String>,
    pub weather_code: Vec<Option<u16>>,
    pub temperature_2m_max: Vec<Option<f64>>,
    pub temperature_2m_min: Vec<Option<f64>>,
    pub sunrise: Vec<String>,
    pub sunset: Vec<String>,
    pub uv_index_max: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastHourly {
    pub time: Vec<String>,
    pub temperature_2m: Vec<Option<f64>>,
    pub weather_code: Vec<Option<u16>>,
    pub relative_humidity_2m: Vec<Option<f64>>,
    pub wind_speed_10m: Vec<Option<f64>>,
    pub uv_index: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct AirQualityResponse {
    pub current: AirQualityCurrent,
    pub hourly: AirQualityHourly,
}

#[derive(Debug, Deserialize)]
pub struct AirQualityCurrent {
    pub us_aqi: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AirQualityHourly {
    pub us_aqi: Vec<Option<f64>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    pub current: CurrentWeather,
    pub daily: DailyWeather,
    pub hourly: HourlyWeather,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    pub temperature: Option<f64>,
    pub weather_code: Option<u16>,
    pub description: &'static str,
    pub is_day: bool,
    pub wind_speed: Option<f64>,
    pub humidity: Option<f64>,
    pub time: String,
    pub aqi: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyWeather {
    pub time: Vec<String>,
    pub weather_code: Vec<Option<u16>>,
    pub temperature_max: Vec<Option<f64>>,
    pub temperature_min: Vec<Option<f64>>,
    pub sunrise: Vec<String>,
    pub sunset: Vec<String>,
    pub uv_index_max: Vec<Option<f64>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyWeather {
    pub time: Vec<String>,
    pub temperature: Vec<Option<f64>>,
    pub weather_code: Vec<Option<u16>>,
    pub aqi: Vec<Option<f64>>,
    pub humidity: Vec<Option<f64>>,
    pub wind_speed: Vec<Option<f64>>,
    pub uv_index: Vec<Option<f64>>,
}
