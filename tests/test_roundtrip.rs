//! Property test: a configuration written back out as YAML loads to the
//! same value through the default loader, `$` characters included.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use era5cfg::config::{
    Area, Bounds, ConfigLoader, Configuration, Dataset, DownloadRequest, ERA5_PRESSURE_LEVELS,
    Frequency, Grid, LevelOut, SixHourlyPostproc, YearSelection,
};
use proptest::prelude::*;

fn dir() -> impl Strategy<Value = PathBuf> {
    "(/[a-z$][a-z0-9_${}]{0,7}){1,4}".prop_map(PathBuf::from)
}

fn year() -> impl Strategy<Value = YearSelection> {
    prop_oneof![
        Just(YearSelection::ExtendExisting),
        (1940..=2020i32, 0..=10i32).prop_map(|(begin, span)| YearSelection::Range {
            begin,
            end: begin + span,
        }),
    ]
}

fn level() -> impl Strategy<Value = LevelOut> {
    prop_oneof![
        Just(LevelOut::Surface),
        Just(LevelOut::Plev37),
        Just(LevelOut::Plev19),
        Just(LevelOut::Plev8),
        proptest::sample::select(ERA5_PRESSURE_LEVELS.to_vec()).prop_map(LevelOut::Pressure),
    ]
}

fn area() -> impl Strategy<Value = Area> {
    let bounds = (-89..=90i32)
        .prop_flat_map(|north| (Just(north), -90..north, -180..=360i32, -180..=360i32))
        .prop_map(|(north, south, west, east)| {
            Area::Bounds(Bounds {
                north: f64::from(north),
                west: f64::from(west),
                south: f64::from(south),
                east: f64::from(east),
            })
        });
    prop_oneof![Just(Area::Global), bounds]
}

prop_compose! {
    fn configuration()(
        tmpdir in dir(),
        storedir in dir(),
        dataset in proptest::sample::select(vec![Dataset::Era5, Dataset::Era5Land]),
        varlist in proptest::collection::vec("[a-z][a-z0-9_$]{2,15}", 1..5),
        year in year(),
        freq in proptest::sample::select(vec![
            Frequency::Instant, Frequency::Hourly, Frequency::SixHourly, Frequency::Monthly,
        ]),
        levelout in level(),
        grid in proptest::sample::select(vec![Grid::Full, Grid::Deg0p1, Grid::Deg0p25, Grid::Deg2p5]),
        area in area(),
        nprocs in 1..=64usize,
        download_request in proptest::sample::select(vec![
            DownloadRequest::Yearly, DownloadRequest::Monthly,
        ]),
        flags in proptest::array::uniform5(any::<bool>()),
        offset in 0..=SixHourlyPostproc::MAX_OFFSET
    ) -> Configuration {
        Configuration {
            tmpdir,
            storedir,
            dataset,
            varlist,
            year,
            freq,
            levelout,
            grid,
            area,
            nprocs: NonZeroUsize::new(nprocs).unwrap(),
            download_request,
            do_retrieve: flags[0],
            do_postproc_6h: SixHourlyPostproc { enabled: flags[1], offset },
            do_postproc_day: flags[2],
            do_postproc_mon: flags[3],
            do_align: flags[4],
        }
    }
}

fn configuration_with_dirs(tmpdir: PathBuf, storedir: PathBuf) -> Configuration {
    Configuration {
        tmpdir,
        storedir,
        dataset: Dataset::Era5,
        varlist: vec!["2m_temperature".to_string()],
        year: YearSelection::Range {
            begin: 1990,
            end: 1990,
        },
        freq: Frequency::Hourly,
        levelout: LevelOut::Surface,
        grid: Grid::Full,
        area: Area::Global,
        nprocs: NonZeroUsize::MIN,
        download_request: DownloadRequest::Yearly,
        do_retrieve: true,
        do_postproc_6h: SixHourlyPostproc::default(),
        do_postproc_day: false,
        do_postproc_mon: false,
        do_align: false,
    }
}

proptest! {
    #[test]
    fn yaml_roundtrip_keeps_literal_references(name in "[A-Z_]{1,8}") {
        let mut config = configuration_with_dirs(
            PathBuf::from(format!("/scratch/${{{name}}}/x")),
            PathBuf::from("/data/a$$b"),
        );
        config.varlist = vec![format!("t$${name}")];
        let yaml = serde_yaml::to_string(&config).unwrap();
        let loaded = ConfigLoader::with_defaults()
            .load_from_str(&yaml)
            .map_err(|e| TestCaseError::fail(format!("{e}\n{yaml}")))?;
        prop_assert_eq!(&*loaded.config, &config);
    }

    #[test]
    fn yaml_roundtrip_preserves_configuration(config in configuration()) {
        let yaml = serde_yaml::to_string(&config).unwrap();
        let loader = ConfigLoader::with_defaults();
        let loaded = loader
            .load_from_str(&yaml)
            .map_err(|e| TestCaseError::fail(format!("{e}\n{yaml}")))?;
        prop_assert_eq!(&*loaded.config, &config);
    }
}
