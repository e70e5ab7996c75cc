use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::Instant;

use oasis::collector::{
    collect, run_collection, write_records, CollectError, CollectOptions, DataApiClient, Dataset, PageSource,
    StopReason,
};
use oasis::config::{CollectorConfig, ItemPolicy};
use oasis::models::{Category, PoiRecord};

/// Serves canned pages in order and remembers which page numbers were asked for.
struct FakeSource {
    pages: Mutex<Vec<Result<Value, CollectError>>>,
    requested: Mutex<Vec<u32>>,
    repeat_last: bool,
}

impl FakeSource {
    fn new(pages: Vec<Result<Value, CollectError>>) -> Self {
        Self {
            pages: Mutex::new(pages),
            requested: Mutex::new(Vec::new()),
            repeat_last: false,
        }
    }

    fn endless(page: Value) -> Self {
        Self {
            pages: Mutex::new(vec![Ok(page)]),
            requested: Mutex::new(Vec::new()),
            repeat_last: true,
        }
    }

    fn requested(&self) -> Vec<u32> {
        self.requested.lock().unwrap().clone()
    }
}

impl PageSource for FakeSource {
    async fn fetch_page(&self, _dataset: Dataset, page_no: u32, _page_size: u32) -> Result<Value, CollectError> {
        self.requested.lock().unwrap().push(page_no);
        let mut pages = self.pages.lock().unwrap();
        if self.repeat_last {
            return match &pages[0] {
                Ok(v) => Ok(v.clone()),
                Err(e) => Err(CollectError::Network(e.to_string())),
            };
        }
        if pages.is_empty() {
            return Ok(food_page(vec![]));
        }
        pages.remove(0)
    }
}

fn item(n: usize, with_coords: bool) -> Value {
    let mut v = json!({
        "MAIN_TITLE": format!("가게 {}", n),
        "GUGUN_NM": "해운대구",
        "ADDR1": format!("부산 해운대구 {}번길", n),
        "ITEMCNTNTS": "돼지국밥 전문점",
        "CNTCT_TEL": "051-000-0000",
        "UC_SEQ": n,
    });
    if with_coords {
        v["LAT"] = json!(format!("35.{}", 100 + n));
        v["LNG"] = json!(129.16);
    } else {
        v["LAT"] = json!("");
    }
    v
}

fn food_page(items: Vec<Value>) -> Value {
    json!({
        "getFoodKr": {
            "header": {"code": "00", "message": "NORMAL_SERVICE"},
            "item": items,
            "numOfRows": 100,
            "pageNo": 1,
            "totalCount": 148
        }
    })
}

fn options(max_pages: u32, policy: ItemPolicy) -> CollectOptions {
    CollectOptions {
        max_pages,
        page_size: 100,
        page_delay: Duration::ZERO,
        item_policy: policy,
        show_progress: false,
    }
}

#[tokio::test]
async fn test_keeps_items_with_coordinates_in_order() {
    let items: Vec<Value> = (0..100).map(|n| item(n, n % 33 != 32)).collect();
    let source = FakeSource::new(vec![Ok(food_page(items)), Ok(food_page(vec![]))]);

    let c = collect(&source, Dataset::Restaurants, &options(10, ItemPolicy::Strict)).await;

    assert_eq!(c.records.len(), 97);
    assert_eq!(c.items_seen, 100);
    assert_eq!(c.items_dropped, 3);
    assert_eq!(c.pages_fetched, 1);
    assert!(matches!(c.stop, StopReason::Exhausted));
    assert_eq!(source.requested(), vec![1, 2]);

    let first = &c.records[0];
    assert_eq!(first.name, "가게 0");
    assert_eq!(first.district, "해운대구");
    assert_eq!(first.address, "부산 해운대구 0번길");
    assert_eq!(first.description, "돼지국밥 전문점");
    assert_eq!(first.phone, "051-000-0000");
    assert_eq!(first.lat, 35.100);
    assert_eq!(first.lng, 129.16);
    assert_eq!(first.category, Category::Restaurant);
    assert_eq!(c.records[1].name, "가게 1");
}

#[tokio::test]
async fn test_missing_wrapper_returns_nothing() {
    let source = FakeSource::new(vec![Ok(json!({"response": {"header": {"resultCode": "99"}}}))]);

    let c = collect(&source, Dataset::Restaurants, &options(10, ItemPolicy::Strict)).await;

    assert!(c.records.is_empty());
    assert!(matches!(c.stop, StopReason::MissingWrapper { page: 1 }));
    assert_eq!(source.requested(), vec![1]);
}

#[tokio::test]
async fn test_stops_at_page_cap() {
    let items: Vec<Value> = (0..5).map(|n| item(n, true)).collect();
    let source = FakeSource::endless(food_page(items));

    let c = collect(&source, Dataset::Restaurants, &options(10, ItemPolicy::Strict)).await;

    assert_eq!(source.requested(), (1..=10).collect::<Vec<_>>());
    assert_eq!(c.pages_fetched, 10);
    assert_eq!(c.records.len(), 50);
    assert!(matches!(c.stop, StopReason::PageCap));
}

#[tokio::test]
async fn test_network_failure_keeps_earlier_pages() {
    let source = FakeSource::new(vec![
        Ok(food_page(vec![item(1, true), item(2, true)])),
        Ok(food_page(vec![item(3, true)])),
        Err(CollectError::Network("connection reset".into())),
        Ok(food_page(vec![item(4, true)])),
    ]);

    let c = collect(&source, Dataset::Restaurants, &options(10, ItemPolicy::Strict)).await;

    assert_eq!(c.records.len(), 3);
    assert!(matches!(c.stop, StopReason::Failed { page: 3, error: CollectError::Network(_) }));
    assert!(c.stop.is_failure());
    assert_eq!(source.requested(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_strict_policy_aborts_on_bad_coordinate() {
    let mut bad = item(9, true);
    bad["LNG"] = json!("east");
    let source = FakeSource::new(vec![
        Ok(food_page(vec![item(1, true)])),
        Ok(food_page(vec![item(2, true), bad.clone(), item(3, true)])),
        Ok(food_page(vec![item(4, true)])),
    ]);

    let c = collect(&source, Dataset::Restaurants, &options(10, ItemPolicy::Strict)).await;

    assert_eq!(c.records.len(), 1);
    assert_eq!(c.records[0].name, "가게 1");
    assert!(matches!(c.stop, StopReason::Failed { page: 2, error: CollectError::Parse { field: "LNG", .. } }));
    assert_eq!(source.requested(), vec![1, 2]);
}

#[tokio::test]
async fn test_skip_policy_isolates_bad_item() {
    let mut bad = item(9, true);
    bad["LAT"] = json!("north");
    let source = FakeSource::new(vec![
        Ok(food_page(vec![item(1, true), bad, item(2, true)])),
        Ok(food_page(vec![item(3, true)])),
    ]);

    let c = collect(&source, Dataset::Restaurants, &options(10, ItemPolicy::Skip)).await;

    let names: Vec<&str> = c.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["가게 1", "가게 2", "가게 3"]);
    assert_eq!(c.items_skipped, 1);
    assert!(matches!(c.stop, StopReason::Exhausted));
}

#[tokio::test]
async fn test_single_object_item() {
    let page = json!({
        "getInfoOfficeKr": {
            "header": {"code": "00", "message": "NORMAL_SERVICE"},
            "item": {"MAIN_TITLE": "부산역 관광안내소", "LAT": 35.115, "LNG": 129.041},
            "totalCount": 1
        }
    });
    let source = FakeSource::new(vec![Ok(page), Ok(json!({"getInfoOfficeKr": {"item": []}}))]);

    let c = collect(&source, Dataset::TouristSpots, &options(10, ItemPolicy::Strict)).await;

    assert_eq!(c.records.len(), 1);
    assert_eq!(c.records[0].category, Category::TouristSpot);
    assert_eq!(c.records[0].lat, 35.115);
    assert!(matches!(c.stop, StopReason::Exhausted));
}

#[tokio::test]
async fn test_zero_page_cap_makes_no_requests() {
    let source = FakeSource::new(vec![]);
    let c = collect(&source, Dataset::Restaurants, &options(0, ItemPolicy::Strict)).await;
    assert!(source.requested().is_empty());
    assert!(matches!(c.stop, StopReason::PageCap));
}

#[tokio::test(start_paused = true)]
async fn test_pauses_between_pages_only() {
    let source = FakeSource::endless(food_page(vec![item(1, true)]));
    let mut opts = options(3, ItemPolicy::Strict);
    opts.page_delay = Duration::from_millis(500);

    let start = Instant::now();
    let c = collect(&source, Dataset::Restaurants, &opts).await;

    // Two gaps between three pages, none after the cap.
    assert_eq!(start.elapsed(), Duration::from_millis(1000));
    assert_eq!(source.requested(), vec![1, 2, 3]);
    assert!(matches!(c.stop, StopReason::PageCap));
}

#[tokio::test(start_paused = true)]
async fn test_pauses_before_the_empty_page() {
    let source = FakeSource::new(vec![
        Ok(food_page(vec![item(1, true)])),
        Ok(food_page(vec![item(2, true)])),
    ]);
    let mut opts = options(10, ItemPolicy::Strict);
    opts.page_delay = Duration::from_millis(500);

    let start = Instant::now();
    let c = collect(&source, Dataset::Restaurants, &opts).await;

    assert_eq!(start.elapsed(), Duration::from_millis(1000));
    assert_eq!(source.requested(), vec![1, 2, 3]);
    assert_eq!(c.records.len(), 2);
    assert!(matches!(c.stop, StopReason::Exhausted));
}

/// Answers a single HTTP request with the given status line and body.
async fn serve_once(status: &'static str, content_type: &'static str, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            content_type,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });
    addr
}

fn local_client(addr: SocketAddr) -> DataApiClient {
    DataApiClient::new(format!("http://{}", addr), "test-key".into(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_fetch_page_reports_http_status() {
    let addr = serve_once("500 Internal Server Error", "text/plain", "upstream down").await;
    let client = local_client(addr);

    let err = client.fetch_page(Dataset::Restaurants, 1, 100).await.unwrap_err();

    match err {
        CollectError::HttpStatus { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream down");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_page_rejects_non_json_body() {
    let addr = serve_once(
        "200 OK",
        "text/xml",
        "<OpenAPI_ServiceResponse><cmmMsgHeader><errMsg>SERVICE ERROR</errMsg></cmmMsgHeader></OpenAPI_ServiceResponse>",
    )
    .await;
    let client = local_client(addr);

    let err = client.fetch_page(Dataset::TouristSpots, 1, 100).await.unwrap_err();

    assert!(matches!(err, CollectError::Shape(_)));
}

#[tokio::test]
async fn test_fetch_page_returns_json_body() {
    let addr = serve_once("200 OK", "application/json", r#"{"getFoodKr":{"item":[]}}"#).await;
    let client = local_client(addr);

    let body = client.fetch_page(Dataset::Restaurants, 2, 50).await.unwrap();

    assert_eq!(body, json!({"getFoodKr": {"item": []}}));
}

fn sample_records() -> Vec<PoiRecord> {
    vec![
        PoiRecord {
            name: "자갈치시장".into(),
            district: "중구".into(),
            lat: 35.0967,
            lng: 129.0305,
            address: "부산광역시 중구 자갈치해안로 52".into(),
            description: "\"싱싱한\" 회".into(),
            phone: "051-245-2594".into(),
            category: Category::Restaurant,
        },
        PoiRecord {
            name: "해운대 관광안내소".into(),
            district: "해운대구".into(),
            lat: 35.1587,
            lng: 129.1604,
            address: String::new(),
            description: String::new(),
            phone: String::new(),
            category: Category::TouristSpot,
        },
    ]
}

#[test]
fn test_write_records_utf8_indented() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("nested").join("data");
    let records = sample_records();

    let path = write_records(&out_dir, "busan_restaurants.json", &records).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();

    assert!(text.contains("자갈치시장"));
    assert!(!text.contains("\\u"));
    assert!(text.starts_with("[\n  {\n    \"name\": \"자갈치시장\",\n    \"district\""));
    assert!(text.contains("\"type\": \"restaurant\""));
    assert!(text.contains("\"type\": \"touristSpot\""));

    let back: Vec<PoiRecord> = serde_json::from_str(&text).unwrap();
    assert_eq!(back, records);
}

#[test]
fn test_write_records_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let records = sample_records();

    let path = write_records(dir.path(), "a.json", &records).unwrap();
    let first = std::fs::read(&path).unwrap();
    write_records(dir.path(), "a.json", &records).unwrap();
    let second = std::fs::read(&path).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_write_empty_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_records(dir.path(), "empty.json", &[]).unwrap();
    assert_eq!(std::fs::read_to_string(path).unwrap(), "[]");
}

#[tokio::test]
async fn test_run_collection_writes_one_file_per_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let config = CollectorConfig {
        api_key: "unused".into(),
        base_url: "http://localhost".into(),
        max_pages: 10,
        page_size: 100,
        page_delay: Duration::ZERO,
        timeout: Duration::from_secs(1),
        output_dir: dir.path().to_path_buf(),
        item_policy: ItemPolicy::Strict,
    };
    // Restaurants: one page then empty. Tourist spots: missing wrapper.
    let source = FakeSource::new(vec![
        Ok(food_page(vec![item(1, true), item(2, false)])),
        Ok(food_page(vec![])),
        Ok(json!({})),
    ]);

    let reports = run_collection(&source, &config, &Dataset::ALL).await.unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].collection.records.len(), 1);
    assert!(reports[1].collection.records.is_empty());

    let restaurants = std::fs::read_to_string(dir.path().join("busan_restaurants.json")).unwrap();
    let parsed: Vec<PoiRecord> = serde_json::from_str(&restaurants).unwrap();
    assert_eq!(parsed[0].name, "가게 1");
    let spots = std::fs::read_to_string(dir.path().join("busan_tourist_spots.json")).unwrap();
    assert_eq!(spots, "[]");
}
