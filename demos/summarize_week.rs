//! Summarize one week of a small CSV export and step back a week

use vitalog::{EngineConfig, Period, PatientSession, RecordAdapter, ReportEncoder};

fn main() {
    let csv = "\
Patient_ID,Date,Mood,Sleep_Hours,Sleep_Quality,Sleep_Quality_Code,Glucose_1,Glucose_Time_1,Glucose_Measurement_Type_1,Systolic_1,Diastolic_1,BP_Time_1,Exercise_Type_1,Exercise_Minutes_1
P001,2024-07-01,happy,7.5,Very good,0,5.8,07:45,Before meal,118,76,08:00,Brisk walking,30
P001,2024-07-02,sad,6.0,Fairly bad,2,8.9,13:10,After meal,131,84,08:05,,
P001,2024-07-03,happy,8.0,Very good,0,6.2,07:50,Before meal,122,79,07:55,Swimming,45
P001,2024-07-09,neutral,6.5,Fairly good,1,7.4,08:10,Before meal,125,80,08:10,Yoga,20
";

    let records = match RecordAdapter::parse_csv_str(csv) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    };

    let date = chrono::NaiveDate::from_ymd_opt(2024, 7, 9);
    let mut session = match PatientSession::from_records(
        "P001",
        &records,
        &EngineConfig::default(),
        date,
        Period::Week,
    ) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    };

    let encoder = ReportEncoder::new();
    session.go_to_previous();
    match serde_json::to_string_pretty(&session.report(&encoder)) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
