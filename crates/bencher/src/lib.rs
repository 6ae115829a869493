use http::Method;
use light_router::{Handler, RouteTable};

#[derive(Debug, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    request: TestRequest,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, request: TestRequest) -> Self {
        Self { name, group, request }
    }

    pub fn small(name: &'static str, request: TestRequest) -> Self {
        Self::new(name, TestGroup::Small, request)
    }

    pub fn normal(name: &'static str, request: TestRequest) -> Self {
        Self::new(name, TestGroup::Normal, request)
    }

    pub fn large(name: &'static str, request: TestRequest) -> Self {
        Self::new(name, TestGroup::Large, request)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn request(&self) -> &TestRequest {
        &self.request
    }

    /// A table sized for this case's group, see [`route_table`].
    pub fn route_table(&self) -> RouteTable {
        route_table(self.group.route_count())
    }
}

#[derive(Debug, Clone)]
pub struct TestRequest {
    method: Method,
    path: &'static str,
}

impl TestRequest {
    pub const fn new(method: Method, path: &'static str) -> Self {
        Self { method, path }
    }

    pub fn get(path: &'static str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &'static str {
        self.path
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}

impl TestGroup {
    /// Number of filler resources registered ahead of the fixed routes.
    pub fn route_count(self) -> usize {
        match self {
            TestGroup::Small => 10,
            TestGroup::Normal => 100,
            TestGroup::Large => 1000,
        }
    }
}

/// Builds a table with `filler` resources (`GET`/`POST /resource{i}/{id:\d+}`) followed by:
///
/// - `GET /`
/// - `GET /test/{id:\d+}/{test:\d+}`
/// - `GET /articles/{id:\d+}`
/// - `GET /articles/{category}[/{title}]`
/// - `POST PUT GET /multiple`
///
/// Fixed routes sit behind the filler, so matching them walks the whole table.
///
/// # Panics
/// If one of the fixture patterns fails to compile.
pub fn route_table(filler: usize) -> RouteTable {
    let table = RouteTable::new();
    let mut routes = table.collector();
    let handler = Handler::controller("Bench", "index");

    for i in 0..filler {
        let path = format!("/resource{i}/{{id:\\d+}}");
        routes.map([Method::GET, Method::POST], &path, handler.clone()).expect("filler pattern is valid");
    }
    routes.get("/", handler.clone()).expect("pattern is valid");
    routes.get("/test/{id:\\d+}/{test:\\d+}", handler.clone()).expect("pattern is valid");
    routes.get("/articles/{id:\\d+}", handler.clone()).expect("pattern is valid");
    routes.get("/articles/{category}[/{title}]", handler.clone()).expect("pattern is valid");
    routes.map([Method::POST, Method::PUT, Method::GET], "/multiple", handler).expect("pattern is valid");

    table
}
