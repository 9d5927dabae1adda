//! End-to-end behaviour of the grid and tile sinks on real files.

use bathymetry_gridder::{BathymetryGrid, Colormap, Error, TileIndex, TileSink};
use constants::{WEB_MERCATOR, WGS84};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const EPSILON: f64 = 1e-9;

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

#[test]
fn average_matches_mean_of_all_samples() {
    let grid = BathymetryGrid::new(WEB_MERCATOR, 0.0, 100.0, 10.0, 0.0, 100.0, 10.0).unwrap();
    let depths: Vec<f64> = (0..37).map(|i| (i as f64 * 1.37).sin() * 50.0 + 20.0).collect();

    for (i, z) in depths.iter().enumerate() {
        // scatter inside the same 10 x 10 cell
        let x = 40.0 + (i % 10) as f64 * 0.9;
        let y = 70.0 + (i % 7) as f64 * 1.3;
        grid.add_sample(WEB_MERCATOR, x, y, *z).unwrap();
    }

    let mean = depths.iter().sum::<f64>() / depths.len() as f64;
    let cell = grid.cell(4, 7).unwrap();
    assert_eq!(cell.count as usize, depths.len());
    assert!((cell.average - mean).abs() < EPSILON);
    assert_eq!(grid.populated_cells(), 1);
}

#[test]
fn samples_past_the_grid_leave_it_unchanged() {
    let grid = BathymetryGrid::new(WEB_MERCATOR, 0.0, 3.0, 1.0, 0.0, 3.0, 1.0).unwrap();
    grid.add_sample(WEB_MERCATOR, 1.5, 1.5, 5.0).unwrap();
    let before = grid.populated();

    assert_eq!(grid.add_sample(WEB_MERCATOR, 4.5, 1.5, 99.0).unwrap(), 0.0);
    assert_eq!(grid.add_sample(WEB_MERCATOR, 1.5, 4.5, 99.0).unwrap(), 0.0);
    assert_eq!(grid.populated(), before);
}

#[test]
fn exactly_one_cell_past_the_edge_is_a_fault() {
    // col == ncols slips past the `col > ncols` rejection and faults instead.
    let grid = BathymetryGrid::new(WEB_MERCATOR, 0.0, 3.0, 1.0, 0.0, 3.0, 1.0).unwrap();
    assert!(matches!(
        grid.add_sample(WEB_MERCATOR, 3.5, 1.5, 1.0),
        Err(Error::CellOutOfRange { col: 3, row: 1 })
    ));
    assert!(matches!(
        grid.add_sample(WEB_MERCATOR, 1.5, -0.1, 1.0),
        Err(Error::CellOutOfRange { col: 1, row: -1 })
    ));
    assert_eq!(grid.populated_cells(), 0);
}

#[test]
fn store_then_load_preserves_every_cell() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("harbour.grid");

    let grid = BathymetryGrid::new(WEB_MERCATOR, -500.0, 500.0, 50.0, -500.0, 500.0, 50.0).unwrap();
    for i in 0..200 {
        let lon = -0.004 + (i as f64) * 0.00004;
        let lat = 0.003 - (i as f64) * 0.00003;
        grid.add_sample(WGS84, lon, lat, 10.0 + i as f64 * 0.1).unwrap();
    }
    grid.store(&path).unwrap();

    let loaded = BathymetryGrid::load(&path).unwrap();
    assert!(loaded.translator_cache().is_empty());
    assert_eq!(loaded.populated(), grid.populated());

    for i in 0..200 {
        let lon = -0.004 + (i as f64) * 0.00004;
        let lat = 0.003 - (i as f64) * 0.00003;
        assert_eq!(
            loaded.bathymetry_at_wgs84(lat, lon),
            grid.bathymetry_at_wgs84(lat, lon)
        );
    }
    assert_eq!(loaded.translator_cache().len(), 1);
}

#[test]
fn xyz_export_has_one_line_per_populated_cell() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("centre.xyz");

    let grid = BathymetryGrid::new(WEB_MERCATOR, 100.0, 130.0, 10.0, 200.0, 230.0, 10.0).unwrap();
    grid.add_sample(WEB_MERCATOR, 115.0, 215.0, 12.5).unwrap();

    grid.write_xyz(&path).unwrap();
    assert_eq!(read_lines(&path), vec!["110 210 12.50"]);
}

#[test]
fn inverted_ingestion_swaps_first_two_fields() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("swapped.xyz");
    fs::write(&input, "1.0, 2.0, 3.0\n").unwrap();

    let inverted = BathymetryGrid::new(WEB_MERCATOR, 0.0, 4.0, 1.0, 0.0, 4.0, 1.0).unwrap();
    inverted.process(&input, WEB_MERCATOR, true, ", ").unwrap();

    let direct = BathymetryGrid::new(WEB_MERCATOR, 0.0, 4.0, 1.0, 0.0, 4.0, 1.0).unwrap();
    direct.add_sample(WEB_MERCATOR, 2.0, 1.0, 3.0).unwrap();

    assert_eq!(inverted.populated(), direct.populated());
    assert_eq!(inverted.cell(2, 1).unwrap().average, 3.0);
}

#[test]
fn grid_pipeline_from_directory_to_png() {
    let temp_dir = TempDir::new().unwrap();
    let survey = temp_dir.path().join("survey");
    fs::create_dir_all(survey.join("day2")).unwrap();
    fs::write(survey.join("day1.xyz"), "0.5 0.5 10\n1.5 0.5 20\n").unwrap();
    fs::write(survey.join("day2").join("LEG.XYZ"), "0.5 0.5 30\ngarbage\n").unwrap();
    fs::write(survey.join("readme.txt"), "0.5 0.5 1000\n").unwrap();

    let grid = BathymetryGrid::new(WEB_MERCATOR, 0.0, 2.0, 1.0, 0.0, 1.0, 1.0).unwrap();
    let stats = grid.process(&survey, WEB_MERCATOR, false, " ").unwrap();
    assert_eq!((stats.files, stats.samples, stats.skipped), (2, 3, 1));
    assert_eq!(grid.cell(0, 0).unwrap().average, 20.0);

    let png = temp_dir.path().join("survey.png");
    grid.write_image(&Colormap::Viridis, 10.0, 30.0, false, &png)
        .unwrap();
    let image = image::open(&png).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (2, 1));
    // both cells sit at the same normalised depth (0.5)
    assert_eq!(image.get_pixel(0, 0), image.get_pixel(1, 0));
}

#[test]
fn equator_tile_is_stable_across_calls() {
    let temp_dir = TempDir::new().unwrap();
    let sink = TileSink::new(temp_dir.path()).unwrap();

    let tiles: Vec<TileIndex> = (0..5)
        .map(|i| sink.add_sample(0.0, 0.0, i as f64, &[]).unwrap())
        .collect();
    assert!(tiles.iter().all(|t| *t == tiles[0]));
    assert_eq!((tiles[0].x, tiles[0].y), (32768, 32768));
    sink.close().unwrap();

    let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(read_lines(&temp_dir.path().join("z16_32768_32768.xyz")).len(), 5);
}

#[test]
fn closing_twice_keeps_written_data() {
    let temp_dir = TempDir::new().unwrap();
    let sink = TileSink::new(temp_dir.path()).unwrap();
    sink.add_sample(41.18, -8.70, 23.4, &[&"sonar"]).unwrap();
    sink.add_sample(-33.9, 151.2, 8.0, &[]).unwrap();
    assert_eq!(sink.open_tiles(), 2);

    sink.close().unwrap();
    sink.close().unwrap();

    let porto = temp_dir
        .path()
        .join(TileIndex::from_wgs84(41.18, -8.70, 16).file_name());
    assert_eq!(read_lines(&porto), vec!["41.18, -8.7, 23.4, sonar"]);
}
