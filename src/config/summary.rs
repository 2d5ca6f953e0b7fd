//! Human-readable configuration summary.

use std::fmt::Write as _;

use crate::config::schema::{Aggregation, Configuration, YearSelection};

/// Renders the summary printed before a workflow run.
#[must_use]
pub fn render(config: &Configuration) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "Download directory: {}", config.tmpdir.display());
    let _ = writeln!(out, "Store directory:    {}", config.storedir.display());
    let _ = writeln!(
        out,
        "Variables:          {} from {}",
        config.varlist.join(", "),
        config.dataset
    );
    match config.year {
        YearSelection::Range { begin, end } => {
            let _ = writeln!(out, "Years:              {begin}-{end}");
        }
        YearSelection::ExtendExisting => {
            let _ = writeln!(out, "Years:              extend existing dataset");
        }
    }
    let levels = config.levelout.pressure_levels();
    if levels.len() <= 1 {
        let _ = writeln!(out, "Vertical levels:    {}", config.levelout);
    } else {
        let hpa: Vec<String> = levels.iter().map(u16::to_string).collect();
        let _ = writeln!(
            out,
            "Vertical levels:    {} ({} hPa)",
            config.levelout,
            hpa.join(", ")
        );
    }
    let _ = writeln!(out, "Frequency:          {}", config.freq);
    let _ = writeln!(out, "Grid:               {}", config.grid);
    let _ = writeln!(out, "Area:               {}", config.area);
    let _ = writeln!(out, "Parallel processes: {}", config.nprocs);
    let _ = writeln!(out, "Download chunks:    {}", config.download_request);

    out.push_str("Actions:\n");
    let mut any = false;
    if config.do_retrieve {
        out.push_str("  - retrieve data\n");
        any = true;
    }
    for aggregation in config.aggregations() {
        let step = match aggregation {
            Aggregation::SixHourly { offset } => {
                format!("6-hourly postprocessing (offset {offset})")
            }
            Aggregation::Daily => "daily postprocessing".to_string(),
            Aggregation::Monthly => "monthly postprocessing".to_string(),
        };
        let _ = writeln!(out, "  - hourly to {step} -> {}", aggregation.label());
        any = true;
    }
    if config.do_align {
        out.push_str("  - align monthly data on a common time axis\n");
        any = true;
    }
    if !any {
        out.push_str("  (none)\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LevelOut;
    use crate::config::schema::tests::sample_config;

    #[test]
    fn test_render_lists_settings_and_actions() {
        let text = render(&sample_config());
        assert!(text.contains("2m_temperature from ERA5"));
        assert!(text.contains("Years:              1990-1992"));
        assert!(text.contains("Grid:               full"));
        assert!(text.contains("Area:               global"));
        assert!(text.contains("  - retrieve data"));
        assert!(text.contains("6-hourly postprocessing (offset 0) -> 6h"));
        assert!(text.contains("hourly to daily postprocessing -> day"));
        assert!(text.contains("Vertical levels:    sfc\n"));
        assert!(!text.contains("monthly postprocessing"));
    }

    #[test]
    fn test_render_lists_pressure_levels() {
        let mut config = sample_config();
        config.levelout = LevelOut::Plev8;
        config.do_postproc_mon = true;

        let text = render(&config);
        assert!(text.contains("plev8 (1000, 850, 700, 500, 250, 100, 50, 10 hPa)"));
        assert!(text.contains("hourly to monthly postprocessing -> mon"));
    }

    #[test]
    fn test_render_update_and_no_actions() {
        let mut config = sample_config();
        config.year = YearSelection::ExtendExisting;
        config.do_retrieve = false;
        config.do_postproc_6h.enabled = false;
        config.do_postproc_day = false;

        let text = render(&config);
        assert!(text.contains("extend existing dataset"));
        assert!(text.contains("(none)"));
    }
}
