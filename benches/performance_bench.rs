use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rwebscan::crawler::SiteCrawler;
use rwebscan::reporting::group_by_class;
use rwebscan::types::{Finding, Target, VulnerabilityClass};

fn sample_page(links: usize) -> String {
    let mut html = String::from("<html><body>");
    for i in 0..links {
        html.push_str(&format!("<a href=\"/page/{}?id={}\">Page {}</a>", i, i, i));
    }
    for i in 0..20 {
        html.push_str(&format!(
            "<form action=\"/submit/{}\" method=\"post\"><input name=\"a\"><input type=\"hidden\" name=\"b\" value=\"x\"></form>",
            i
        ));
    }
    html.push_str("<script>fetch('/api/one'); fetch(\"/api/two\");</script></body></html>");
    html
}

fn crawler_benchmark(c: &mut Criterion) {
    let target = Target::new("http://bench.test", 10, None).unwrap();
    let crawler = SiteCrawler::new(false);
    let strict = SiteCrawler::new(true);
    let page = sample_page(500);

    c.bench_function("parse_page", |b| {
        b.iter(|| crawler.parse_page(black_box(&page), &target))
    });

    c.bench_function("parse_page_strict_origin", |b| {
        b.iter(|| strict.parse_page(black_box(&page), &target))
    });
}

fn aggregation_benchmark(c: &mut Criterion) {
    let classes = [
        VulnerabilityClass::SqlInjection,
        VulnerabilityClass::CrossSiteScripting,
        VulnerabilityClass::Csrf,
        VulnerabilityClass::InsecureHttpMethods,
        VulnerabilityClass::SensitiveFileExposure,
    ];
    let findings: Vec<Finding> = (0..5000)
        .map(|i| {
            let url = format!("http://bench.test/p/{}", i);
            Finding::new(classes[i % classes.len()], url.as_str(), "payload", url.as_str())
        })
        .collect();

    c.bench_function("group_by_class", |b| {
        b.iter(|| group_by_class(black_box(findings.clone())))
    });
}

criterion_group!(benches, crawler_benchmark, aggregation_benchmark);
criterion_main!(benches);
