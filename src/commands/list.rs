// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use owo_colors::OwoColorize;
use std::fmt::Write;

use crate::cluster::Cluster;
use crate::segment::SegmentConfig;

/// One line per segment, grouped by content id, primary first.
pub fn format_segments(cluster: &Cluster) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\n{} {} ({} {}, {} {})\n",
        "▶".cyan(),
        "Segment configuration".bold(),
        cluster.content_ids().len().to_string().yellow(),
        if cluster.content_ids().len() == 1 {
            "content"
        } else {
            "contents"
        },
        cluster.hostnames().len().to_string().yellow(),
        if cluster.hostnames().len() == 1 {
            "host"
        } else {
            "hosts"
        }
    );

    for &content in cluster.content_ids() {
        for segment in cluster.segments_for_content(content) {
            let bullet = if segment.is_mirror() {
                "○".dimmed().to_string()
            } else {
                "●".blue().to_string()
            };
            let _ = writeln!(
                out,
                "  {} {:>4}  {:<7} dbid {:<4} {}:{}  {}",
                bullet,
                content,
                role_label(segment),
                segment.dbid,
                segment.hostname.bold(),
                segment.port,
                segment.data_dir.dimmed()
            );
        }
    }
    out
}

fn role_label(segment: &SegmentConfig) -> &'static str {
    match (segment.is_coordinator(), segment.is_mirror()) {
        (true, false) => "coord",
        (true, true) => "standby",
        (false, false) => "primary",
        (false, true) => "mirror",
    }
}

/// Distinct hostnames in topology order.
pub fn format_hosts(cluster: &Cluster) -> String {
    let mut out = String::new();
    for host in cluster.hostnames() {
        let contents = cluster.contents_for_host(host);
        let _ = writeln!(
            out,
            "  {} {} ({} {})",
            "●".blue(),
            host.bold(),
            contents.len().to_string().yellow(),
            if contents.len() == 1 {
                "segment"
            } else {
                "segments"
            }
        );
    }
    out
}

pub fn list_topology(cluster: &Cluster, hosts: bool) {
    if cluster.segments().is_empty() {
        println!("{}", "No segments configured".dimmed());
        return;
    }
    if hosts {
        print!("{}", format_hosts(cluster));
    } else {
        println!("{}", format_segments(cluster));
    }
}
