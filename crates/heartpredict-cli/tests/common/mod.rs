use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub const HEADER: &str = "age,anaemia,creatinine_phosphokinase,diabetes,ejection_fraction,\
high_blood_pressure,platelets,serum_creatinine,serum_sodium,sex,smoking,time,DEATH_EVENT";

/// Write `n` deterministic clinical records to `dir/records.csv`.
pub fn write_records(dir: &Path, n: usize) -> PathBuf {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in 0..n {
        let serum_creatinine = 0.6 + (i * 13 % 30) as f64 / 10.0;
        let ejection_fraction = 20 + i * 11 % 45;
        let mut death = serum_creatinine / 3.6 - ejection_fraction as f64 / 65.0 > -0.1;
        if i % 7 == 0 {
            death = !death;
        }
        let time = if death { 10 + i % 60 } else { 100 + i * 17 % 180 };
        writeln!(
            csv,
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            40 + i * 7 % 55,
            (i % 3 == 0) as u8,
            100 + i * 37 % 900,
            (i % 4 == 1) as u8,
            ejection_fraction,
            (i % 5 == 2) as u8,
            150_000 + i * 1301 % 200_000,
            serum_creatinine,
            125 + i * 3 % 20,
            i % 2,
            (i % 3 == 0) as u8,
            time,
            death as u8
        )
        .unwrap();
    }
    let path = dir.join("records.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

/// Feature rows without the label column.
pub fn write_patients(dir: &Path) -> PathBuf {
    let csv = "age,anaemia,creatinine_phosphokinase,diabetes,ejection_fraction,\
high_blood_pressure,platelets,serum_creatinine,serum_sodium,sex,smoking,time\n\
75,0,582,0,20,1,265000,3.4,130,1,0,20\n\
50,1,120,0,60,0,300000,0.8,140,0,0,250\n";
    let path = dir.join("patients.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

/// Small training configuration keeping the forest cheap.
pub fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("config.json");
    std::fs::write(&path, r#"{"n_estimators": 10, "seed": 42}"#).unwrap();
    path
}
