//! Open-Meteo forecast and air-quality lookups for Kochi.

pub mod types;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use types::{
    AirQualityResponse, CurrentWeather, DailyWeather, ForecastResponse, HourlyWeather,
    WeatherData,
};

pub const OPEN_METEO_URL: &str = "https://api.open-meteo.com";
pub const OPEN_METEO_AIR_URL: &str = "https://air-quality-api.open-meteo.com";

const LATITUDE: &str = "9.9312";
const LONGITUDE: &str = "76.2673";

const CURRENT_VARS: &str = "temperature_2m,relative_humidity_2m,is_day,weather_code,wind_speed_10m";
const HOURLY_VARS: &str = "temperature_2m,weather_code,relative_humidity_2m,wind_speed_10m,uv_index";
const DAILY_VARS: &str =
    "weather_code,temperature_2m_max,temperature_2m_min,sunrise,sunset,uv_index_max";

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },
}

#[derive(Clone)]
pub struct WeatherClient {
    http: Client,
    forecast_url: String,
    air_quality_url: String,
}

impl WeatherClient {
    pub fn new(http: Client, forecast_url: &str, air_quality_url: &str) -> Self {
        Self {
            http,
            forecast_url: forecast_url.trim_end_matches('/').to_string(),
            air_quality_url: air_quality_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch forecast and AQI concurrently; either failing fails the lookup.
    pub async fn current(&self) -> Result<WeatherData, WeatherError> {
        let forecast = self.get_json::<ForecastResponse>(
            "forecast",
            format!("{}/v1/forecast", self.forecast_url),
            &[
                ("current", CURRENT_VARS),
                ("hourly", HOURLY_VARS),
                ("daily", DAILY_VARS),
                ("timezone", "auto"),
            ],
        );
        let air = self.get_json::<AirQualityResponse>(
            "air-quality",
            format!("{}/v1/air-quality", self.air_quality_url),
            &[("current", "us_aqi"), ("hourly", "us_aqi")],
        );

        let (forecast, air) = tokio::join!(forecast, air);
        let data = merge(forecast?, air?);
        debug!(temperature = ?data.current.temperature, "weather fetched");
        Ok(data)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: String,
        params: &[(&str, &str)],
    ) -> Result<T, WeatherError> {
        let response = self
            .http
            .get(url)
            .header("User-Agent", crate::USER_AGENT)
            .query(&[("latitude", LATITUDE), ("longitude", LONGITUDE)])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status {
                service,
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}

fn merge(forecast: ForecastResponse, air: AirQualityResponse) -> WeatherData {
    let ForecastResponse {
        current,
        daily,
        hourly,
    } = forecast;

    WeatherData {
        current: CurrentWeather {
            temperature: current.temperature_2m,
            weather_code: current.weather_code,
            description: current.weather_code.map_or("Unknown", describe),
            is_day: current.is_day.is_some_and(|d| d != 0),
            wind_speed: current.wind_speed_10m,
            humidity: current.relative_humidity_2m,
            time: current.time,
            aqi: air.current.us_aqi,
        },
        daily: DailyWeather {
            time: daily.time,
            weather_code: daily.weather_code,
            temperature_max: daily.temperature_2m_max,
            temperature_min: daily.temperature_2m_min,
            sunrise: daily.sunrise,
            sunset: daily.sunset,
            uv_index_max: daily.uv_index_max,
        },
        hourly: HourlyWeather {
            time: hourly.time,
            temperature: hourly.temperature_2m,
            weather_code: hourly.weather_code,
            aqi: air.hourly.us_aqi,
            humidity: hourly.relative_humidity_2m,
            wind_speed: hourly.wind_speed_10m,
            uv_index: hourly.uv_index,
        },
    }
}

/// WMO weather interpretation code to English text.
pub fn describe(code: u16) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        71 => "Slight snow",
        73 => "Moderate snow",
        75 => "Heavy snow",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}
