//! Prompt construction for the classifier and the reply formatter.
//!
//! The classifier prompt embeds a description of the transport database so
//! the model can write SQL against it. Deployments with a different schema
//! point `[pipeline] schema_path` at their own description.

use relaybot_core::query::Row;
use std::path::Path;

/// Built-in description of the transport database.
pub const TRANSPORT_SCHEMA: &str = r#"
buses (bus_id INT PK, bus_number VARCHAR(50), capacity INT,
       status ENUM('available','running','maintenance','alternate'),
       current_driver_id INT FK -> drivers.driver_id)

drivers (driver_id INT PK, name VARCHAR(100), mobile VARCHAR(15), license_no VARCHAR(50),
         assigned_bus_id INT FK -> buses.bus_id, created_at TIMESTAMP)

driver_sessions (session_id INT PK, driver_id INT FK -> drivers.driver_id,
                 bus_id INT FK -> buses.bus_id, route_id INT FK -> routes.route_id,
                 start_time TIMESTAMP, end_time TIMESTAMP, performance_rating DECIMAL(3,2))

routes (route_id INT PK, source_name VARCHAR(100), source_lat DECIMAL(10,6), source_lon DECIMAL(10,6),
        destination_name VARCHAR(100), destination_lat DECIMAL(10,6), destination_lon DECIMAL(10,6),
        total_distance_km DECIMAL(8,2))

stops (stop_id INT PK, route_id INT FK -> routes.route_id, stop_name VARCHAR(100),
       stop_lat DECIMAL(10,6), stop_lon DECIMAL(10,6), sequence_no INT)

eta_predictions (eta_id INT PK, bus_id INT FK -> buses.bus_id, stop_id INT FK -> stops.stop_id,
                 predicted_arrival TIMESTAMP, minutes_remaining INT, last_updated TIMESTAMP)

location_updates (location_id INT PK, bus_id INT FK -> buses.bus_id,
                  latitude DECIMAL(10,6), longitude DECIMAL(10,6), timestamp TIMESTAMP)

route_progress (progress_id INT PK, session_id INT FK -> driver_sessions.session_id,
                stop_id INT FK -> stops.stop_id, arrival_time TIMESTAMP, departure_time TIMESTAMP)

reports (report_id INT PK, user_id INT FK -> users.user_id, bus_id INT FK -> buses.bus_id,
         report_type ENUM('accident','delay','other'), location_lat DECIMAL(10,6),
         location_lon DECIMAL(10,6), description TEXT, media_url VARCHAR(255), created_at TIMESTAMP)

users (user_id INT PK, name VARCHAR(100), age INT, email VARCHAR(150), mobile VARCHAR(15),
       region VARCHAR(100), created_at TIMESTAMP)

driver_routes (id INT PK, route_number VARCHAR UNIQUE, route_name VARCHAR, source_stop VARCHAR,
               destination_stop VARCHAR, total_stops INT, estimated_duration INT,
               is_active TINYINT, created_at TIMESTAMP, updated_at TIMESTAMP)

driver_route_stops (id INT PK, route_id INT FK -> driver_routes.id, stop_name VARCHAR,
                    stop_order INT, latitude DECIMAL, longitude DECIMAL,
                    estimated_arrival_time TIME, created_at TIMESTAMP)

latest_driver_locations (session_id INT, driver_id INT, route_id INT, bus_number VARCHAR,
                         session_status ENUM('offline','online','active'), driver_name VARCHAR,
                         route_name VARCHAR, latitude DECIMAL, longitude DECIMAL, speed FLOAT,
                         last_update TIMESTAMP, seconds_since_update BIGINT)

bus_realtime_status (id INT PK, bus_id INT FK -> buses.bus_id, current_latitude DECIMAL,
                     current_longitude DECIMAL, speed DECIMAL, fuel_level INT, passenger_count INT,
                     next_stop_id INT, eta_next_stop TIME, last_updated TIMESTAMP,
                     driver_id INT FK -> drivers.driver_id, is_delayed TINYINT, delay_minutes INT)

stop_arrivals (id INT PK, session_id INT, stop_id INT, arrival_time TIMESTAMP)

Example:
SELECT b.bus_number, r.source_name, r.destination_name, b.status
FROM buses b
JOIN driver_sessions s ON s.bus_id = b.bus_id AND s.end_time IS NULL
JOIN routes r ON r.route_id = s.route_id
WHERE r.source_name LIKE '%Chandigarh%' AND r.destination_name LIKE '%Ludhiana%';
"#;

/// Prompt templates bound to one schema description.
#[derive(Debug, Clone)]
pub struct PromptSet {
    schema: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::new(TRANSPORT_SCHEMA)
    }
}

impl PromptSet {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
        }
    }

    /// Use the schema file at `path`, or the built-in schema when `None`.
    pub fn load(path: Option<&Path>) -> std::io::Result<Self> {
        match path {
            Some(p) => Ok(Self::new(std::fs::read_to_string(p)?)),
            None => Ok(Self::default()),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// The classification prompt for one utterance.
    pub fn classification(&self, utterance: &str, context: &str) -> String {
        format!(
            r#"You are a public transport assistant chatbot.
User message: "{utterance}"
Conversation so far:
"{context}"

Use this database schema when writing SQL:
{schema}

Respond with strict JSON only:
{{
  "intent": "Query | unQuery | other",
  "language": "<locale tag of the user's language, e.g. en-IN, hi-IN, pa-IN>",
  "reply": "<SQL query, clarifying question, or direct answer>"
}}

Rules:
- Questions about buses, routes, stops, drivers, arrival times or tickets that carry enough detail: intent "Query", reply is one SQL SELECT statement.
- Such questions missing details (no source or destination, unknown stop): intent "unQuery", reply asks for the missing detail.
- Greetings, small talk and anything else: intent "other", reply answers directly.
- "language" matches the language the user wrote in.
- Write SQL in English; place names inside SQL must be in English."#,
            schema = self.schema.trim(),
        )
    }

    /// The narration prompt for a data question's rows.
    pub fn narration(&self, utterance: &str, rows: &[Row], language: &str) -> String {
        let rows_json = serde_json::to_string(rows).unwrap_or_else(|_| "[]".into());
        format!(
            r#"The user asked: "{utterance}"
Database result (JSON rows): {rows_json}
Language: {language}

Write one short, natural reply to the user in that language, using only the database result.
If the result is empty, say that no matching information was found.
Plain text only, no markdown.
Example: "The next bus from Sector 10 to Civil Lines is Bus 21, arriving in 8 minutes.""#
        )
    }
}
