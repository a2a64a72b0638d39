use std::path::PathBuf;

use quotepress::{JobSpec, LogoCorner, VarianceMode};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "quotepress_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

const JOB_JSON: &str = r#"{
    "page_id": "42",
    "image_folder": "images",
    "output_folder": "out",
    "logo_file": "logo.png",
    "watermark_file": "mark.png",
    "font_file": "font.ttf",
    "quotes": ["stay curious"],
    "keywords": ["calm", "focus"],
    "image_name": "daily",
    "insertion_id": "gallery",
    "count_attribute": "data-img-count",
    "variance": "different_quote",
    "logo_corner": "top_right",
    "image_size": { "width": 1080, "height": 1080 },
    "font_size": 48,
    "seed": 9
}"#;

#[test]
fn job_file_loads_and_validates() {
    let tmp = temp_dir("job_json");
    std::fs::create_dir_all(&tmp).unwrap();
    let path = tmp.join("job.json");
    std::fs::write(&path, JOB_JSON).unwrap();

    let f = std::fs::File::open(&path).unwrap();
    let job: JobSpec = serde_json::from_reader(std::io::BufReader::new(f)).unwrap();
    job.validate().unwrap();

    assert_eq!(job.variance, VarianceMode::DifferentQuote);
    assert_eq!(job.logo_corner, LogoCorner::TopRight);
    assert_eq!(job.image_size.unwrap().width, 1080);
    assert_eq!(job.font_size, Some(48.0));
    assert!(job.logo_size.is_none());

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn job_missing_required_field_fails_to_parse() {
    let broken = JOB_JSON.replace(r#""insertion_id": "gallery","#, "");
    assert!(serde_json::from_str::<JobSpec>(&broken).is_err());
}

#[test]
fn job_with_blank_count_attribute_fails_validation() {
    let mut job: JobSpec = serde_json::from_str(JOB_JSON).unwrap();
    job.count_attribute = String::new();
    assert!(job.validate().is_err());
}
