//! JSON body of a scale report request.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;

use super::ReportRequest;
use crate::config::ReportTuning;

/// Boost settings embedded in the request as a JSON *string*.
#[derive(Debug, Serialize)]
pub struct StyleClusterBoost {
    pub boost: i64,
    /// `"{cluster},0"`.
    pub clusters: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleReportBody<'a> {
    pub report_id: i64,
    pub page_size: u32,
    pub pie_recency_max_brand_new: u32,
    pub pie_recency_max_fresh: u32,
    pub pie_relevancy_max_low_confidence: u32,
    pub pie_global_relevancy_max_low_confidence: u32,
    pub pie_calculated_relevancy_max_low_confidence: u32,
    pub pie_keyword_low_impression: f64,
    pub pie_keyword_high_impression: f64,
    pub pie_true_low_impression: f64,
    pub pie_true_high_impression: f64,
    pub pie_asset_low_impression: f64,
    pub pie_asset_high_impression: f64,
    pub pie_low_download_ratio: u32,
    pub pie_high_download_ratio: u32,
    pub avg_relevancy_score_filter_outliers: bool,
    pub recency_score_filter_outliers: bool,
    pub query_set_type: &'a str,
    pub query_set_id: String,
    pub query_set_start_time: String,
    pub query_set_duration: u32,
    pub query_set_target_search_mix: Option<&'a str>,
    pub algorithm_ids: [i64; 1],
    pub page_no: u32,
    pub user_profile: &'static str,
    pub solr_farms_by_algorithm_ids: BTreeMap<String, &'static str>,
    pub content_scopes: &'a [String],
    pub style_cluster_boost: String,
}

impl<'a> ScaleReportBody<'a> {
    pub fn new(
        tuning: &'a ReportTuning,
        request: &ReportRequest,
        query_set_start_time: String,
    ) -> Result<Self, serde_json::Error> {
        let style_cluster_boost = serde_json::to_string(&StyleClusterBoost {
            boost: request.key.boost,
            clusters: format!("{},0", request.key.cluster),
        })?;
        Ok(Self {
            report_id: tuning.report_id,
            page_size: tuning.page_size,
            pie_recency_max_brand_new: tuning.pie_recency_max_brand_new,
            pie_recency_max_fresh: tuning.pie_recency_max_fresh,
            pie_relevancy_max_low_confidence: tuning.pie_relevancy_max_low_confidence,
            pie_global_relevancy_max_low_confidence: tuning
                .pie_global_relevancy_max_low_confidence,
            pie_calculated_relevancy_max_low_confidence: tuning
                .pie_calculated_relevancy_max_low_confidence,
            pie_keyword_low_impression: tuning.pie_keyword_low_impression,
            pie_keyword_high_impression: tuning.pie_keyword_high_impression,
            pie_true_low_impression: tuning.pie_true_low_impression,
            pie_true_high_impression: tuning.pie_true_high_impression,
            pie_asset_low_impression: tuning.pie_asset_low_impression,
            pie_asset_high_impression: tuning.pie_asset_high_impression,
            pie_low_download_ratio: tuning.pie_low_download_ratio,
            pie_high_download_ratio: tuning.pie_high_download_ratio,
            avg_relevancy_score_filter_outliers: tuning.avg_relevancy_score_filter_outliers,
            recency_score_filter_outliers: tuning.recency_score_filter_outliers,
            query_set_type: &tuning.query_set_type,
            query_set_id: request.query_set.to_string(),
            query_set_start_time,
            query_set_duration: tuning.query_set_duration,
            query_set_target_search_mix: None,
            algorithm_ids: [request.alg_id],
            page_no: tuning.page_no,
            user_profile: request.user_profile.as_str(),
            solr_farms_by_algorithm_ids: BTreeMap::from([(request.alg_id.to_string(), "false")]),
            content_scopes: &tuning.content_scopes,
            style_cluster_boost,
        })
    }
}

/// Start of the query set window: one day before `now`, truncated to the hour.
pub fn query_set_start_time(now: NaiveDateTime) -> String {
    (now - TimeDelta::days(1))
        .format("%Y-%m-%d %H:00:00")
        .to_string()
}

/// Compact JSON for one request, with the window starting relative to `now`.
pub fn build_body(
    tuning: &ReportTuning,
    request: &ReportRequest,
    now: NaiveDateTime,
) -> Result<String, serde_json::Error> {
    let body = ScaleReportBody::new(tuning, request, query_set_start_time(now))?;
    serde_json::to_string(&body)
}
