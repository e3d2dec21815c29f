use time::{macros::format_description, Date};

use crate::domain::MeasurementRecord;

/// Per-pipeline aggregate over one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineLoad {
    pub name: String,
    pub points: usize,
    pub avg_load_level: f64,
    pub max_actual_flow: f64,
    pub max_technical_flow: f64,
}

fn parse_period(period: &str) -> Option<Date> {
    Date::parse(period.trim(), format_description!("[day]/[month]/[year]")).ok()
}

/// Records for a single pipeline, ordered by period.
///
/// Periods that are not `dd/mm/yyyy` dates keep their snapshot order and come
/// after the dated ones.
pub fn pipeline_profile(records: &[MeasurementRecord], name: &str) -> Vec<MeasurementRecord> {
    let mut rows: Vec<(Option<Date>, &MeasurementRecord)> = records
        .iter()
        .filter(|r| r.name == name)
        .map(|r| (parse_period(&r.period), r))
        .collect();

    // Stable sort keeps snapshot order among equal keys.
    rows.sort_by_key(|(date, _)| match date {
        Some(d) => (0, Some(*d)),
        None => (1, None),
    });

    rows.into_iter().map(|(_, r)| r.clone()).collect()
}

/// One aggregate per distinct pipeline name, in first-seen order.
pub fn aggregate_by_pipeline(records: &[MeasurementRecord]) -> Vec<PipelineLoad> {
    let mut out: Vec<PipelineLoad> = Vec::new();

    for r in records {
        let idx = match out.iter().position(|p| p.name == r.name) {
            Some(idx) => idx,
            None => {
                out.push(PipelineLoad {
                    name: r.name.clone(),
                    points: 0,
                    avg_load_level: 0.0,
                    max_actual_flow: f64::MIN,
                    max_technical_flow: f64::MIN,
                });
                out.len() - 1
            }
        };

        let agg = &mut out[idx];
        agg.points += 1;
        // Running mean.
        agg.avg_load_level += (r.load_level - agg.avg_load_level) / agg.points as f64;
        agg.max_actual_flow = agg.max_actual_flow.max(r.actual_flow);
        agg.max_technical_flow = agg.max_technical_flow.max(r.technical_flow);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, period: &str, load: f64, actual: f64) -> MeasurementRecord {
        MeasurementRecord {
            name: name.to_string(),
            connection_point: String::new(),
            mg: 0.0,
            km: None,
            period: period.to_string(),
            load_level: load,
            actual_flow: actual,
            technical_flow: 10.0,
        }
    }

    #[test]
    fn profile_orders_by_date_and_keeps_undated_last() {
        let records = vec![
            rec("A", "15/03/2023", 0.1, 1.0),
            rec("B", "01/01/2023", 0.2, 2.0),
            rec("A", "Q1 2023", 0.3, 3.0),
            rec("A", "01/02/2023", 0.4, 4.0),
            rec("A", "31/12/2022", 0.5, 5.0),
        ];

        let periods: Vec<_> = pipeline_profile(&records, "A")
            .into_iter()
            .map(|r| r.period)
            .collect();

        assert_eq!(periods, vec!["31/12/2022", "01/02/2023", "15/03/2023", "Q1 2023"]);
    }

    #[test]
    fn aggregate_groups_in_first_seen_order() {
        let records = vec![
            rec("B", "", 0.5, 1.0),
            rec("A", "", 1.0, 7.0),
            rec("B", "", 1.5, 3.0),
        ];

        let agg = aggregate_by_pipeline(&records);

        assert_eq!(agg.len(), 2);
        assert_eq!(agg[0].name, "B");
        assert_eq!(agg[0].points, 2);
        assert!((agg[0].avg_load_level - 1.0).abs() < 1e-12);
        assert_eq!(agg[0].max_actual_flow, 3.0);
        assert_eq!(agg[1].name, "A");
        assert_eq!(agg[1].max_technical_flow, 10.0);
    }

    #[test]
    fn aggregate_of_empty_snapshot_is_empty() {
        assert!(aggregate_by_pipeline(&[]).is_empty());
    }
}
