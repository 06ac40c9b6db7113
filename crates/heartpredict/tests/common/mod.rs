use heartpredict::data_handling::{ProjectData, Table};

/// Deterministic stand-in for the clinical records: deaths follow high serum
/// creatinine and low ejection fraction, with every seventh label flipped.
pub fn synthetic_table(n: usize) -> Table {
    let mut columns: Vec<(&str, Vec<f64>)> = vec![
        ("age", vec![]),
        ("anaemia", vec![]),
        ("creatinine_phosphokinase", vec![]),
        ("diabetes", vec![]),
        ("ejection_fraction", vec![]),
        ("high_blood_pressure", vec![]),
        ("platelets", vec![]),
        ("serum_creatinine", vec![]),
        ("serum_sodium", vec![]),
        ("sex", vec![]),
        ("smoking", vec![]),
        ("time", vec![]),
        ("DEATH_EVENT", vec![]),
    ];
    for i in 0..n {
        let serum_creatinine = 0.6 + (i * 13 % 30) as f64 / 10.0;
        let ejection_fraction = (20 + i * 11 % 45) as f64;
        let mut death = serum_creatinine / 3.6 - ejection_fraction / 65.0 > -0.1;
        if i % 7 == 0 {
            death = !death;
        }
        let time = (if death { 10 + i % 60 } else { 100 + i * 17 % 180 }) as f64;
        let row = [
            (40 + i * 7 % 55) as f64,
            (i % 3 == 0) as u8 as f64,
            (100 + i * 37 % 900) as f64,
            (i % 4 == 1) as u8 as f64,
            ejection_fraction,
            (i % 5 == 2) as u8 as f64,
            (150_000 + i * 1301 % 200_000) as f64,
            serum_creatinine,
            (125 + i * 3 % 20) as f64,
            (i % 2) as f64,
            (i * 7 % 3 == 0) as u8 as f64,
            time,
            death as u8 as f64,
        ];
        for (column, value) in columns.iter_mut().zip(row) {
            column.1.push(value);
        }
    }
    Table::from_columns(columns).expect("synthetic table")
}

pub fn synthetic_project(n: usize) -> ProjectData {
    ProjectData::from_table("synthetic.csv", synthetic_table(n)).expect("synthetic project")
}
