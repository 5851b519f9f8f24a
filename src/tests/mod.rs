mod invalid_json;
mod month_summary;
mod posts;
mod publish;
